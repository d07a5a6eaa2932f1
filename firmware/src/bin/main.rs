#![no_std]
#![no_main]

use cortex_m_rt::entry;
use defmt::info;
use defmt_rtt as _;
use drive_core::{ActuatorMapper, IndicatorDriver};
use embassy_executor::{Executor, InterruptExecutor};
use embassy_rp::bind_interrupts;
use embassy_rp::gpio::{Input, Level, Output, Pull};
use embassy_rp::interrupt;
use embassy_rp::interrupt::{InterruptExt, Priority};
use embassy_rp::peripherals::UART1;
use embassy_rp::pwm::Pwm;
use embassy_rp::uart::{Async, Config as UartConfig, Uart, UartRx, UartTx};
use embassy_time::{Duration, Instant, Ticker, Timer};
use rc_drive_controller::{
    capture_pulses, read_bytes, servo_pwm_config, write_status_lines, ByteQueue, LedIndicator,
    PulseChannel, QueueStatusSink, RcChannels, ServoPwm, StatusLine, StatusQueue,
    VehicleController, CONFIG, CONTROL_PERIOD_MS, ESC_ARMING_MS,
};
use static_cell::StaticCell;

#[cfg(feature = "dev-panic")]
use panic_probe as _;
#[cfg(feature = "prod-panic")]
use panic_reset as _;

bind_interrupts!(struct Irqs {
    UART1_IRQ => embassy_rp::uart::InterruptHandler<UART1>;
});

type Controller = VehicleController<
    'static,
    ServoPwm<Pwm<'static>>,
    ServoPwm<Pwm<'static>>,
    LedIndicator<Output<'static>>,
    LedIndicator<Output<'static>>,
    QueueStatusSink,
>;

/// Receiver channels, written by the edge tasks and read by the control task.
static STEERING_IN: PulseChannel = PulseChannel::new();
static THROTTLE_IN: PulseChannel = PulseChannel::new();
static MODE_IN: PulseChannel = PulseChannel::new();

static RX_BYTES: ByteQueue = ByteQueue::new();
static STATUS_LINES: StatusQueue = StatusQueue::new();

/// Edge capture preempts everything else.
static EXECUTOR_HIGH: InterruptExecutor = InterruptExecutor::new();
static EXECUTOR_LOW: StaticCell<Executor> = StaticCell::new();

#[interrupt]
unsafe fn SWI_IRQ_1() {
    EXECUTOR_HIGH.on_interrupt()
}

#[entry]
fn main() -> ! {
    info!("RC drive controller starting...");

    let p = embassy_rp::init(embassy_rp::config::Config::default());

    // --- Actuators: attach at neutral before anything else runs ---
    let steering_pwm =
        Pwm::new_output_a(p.PWM_SLICE5, p.PIN_10, servo_pwm_config(drive_proto::NEUTRAL_US));
    let drive_pwm =
        Pwm::new_output_a(p.PWM_SLICE6, p.PIN_12, servo_pwm_config(CONFIG.stop_pulse));
    let mapper =
        ActuatorMapper::new(ServoPwm::new(steering_pwm), ServoPwm::new(drive_pwm), CONFIG);

    let left = LedIndicator::new(Output::new(p.PIN_6, Level::Low));
    let right = LedIndicator::new(Output::new(p.PIN_7, Level::Low));
    let indicators = IndicatorDriver::new(left, right, &CONFIG);

    // --- UART Setup ---
    let mut uart_config = UartConfig::default();
    uart_config.baudrate = 115_200;

    let uart = Uart::new(
        p.UART1,
        p.PIN_8, // TX
        p.PIN_9, // RX
        Irqs,
        p.DMA_CH0,
        p.DMA_CH1,
        uart_config,
    );
    let (tx, rx) = uart.split();

    // --- Receiver inputs ---
    let steering_in = Input::new(p.PIN_2, Pull::Down);
    let throttle_in = Input::new(p.PIN_3, Pull::Down);
    let mode_in = Input::new(p.PIN_4, Pull::Down);

    let rc = RcChannels {
        steering: &STEERING_IN,
        throttle: &THROTTLE_IN,
        mode: &MODE_IN,
    };
    let status = QueueStatusSink::new(&STATUS_LINES);
    let controller = VehicleController::new(rc, mapper, indicators, status);

    // High-priority executor for edge capture
    interrupt::SWI_IRQ_1.set_priority(Priority::P2);
    let high = EXECUTOR_HIGH.start(interrupt::SWI_IRQ_1);
    high.spawn(capture_task(steering_in, &STEERING_IN).unwrap());
    high.spawn(capture_task(throttle_in, &THROTTLE_IN).unwrap());
    high.spawn(capture_task(mode_in, &MODE_IN).unwrap());

    // Everything else runs in thread mode
    let executor = EXECUTOR_LOW.init(Executor::new());
    executor.run(|spawner| {
        spawner.spawn(uart_rx_task(rx).unwrap());
        spawner.spawn(uart_tx_task(tx).unwrap());
        spawner.spawn(control_task(controller).unwrap());
    })
}

/// Edge capture task - one instance per receiver channel.
#[embassy_executor::task(pool_size = 3)]
async fn capture_task(pin: Input<'static>, channel: &'static PulseChannel) {
    capture_pulses(pin, channel).await
}

/// UART receive task - forwards command bytes to the control task.
#[embassy_executor::task]
async fn uart_rx_task(rx: UartRx<'static, Async>) {
    read_bytes(rx, &RX_BYTES).await
}

/// UART transmit task - writes queued status lines.
#[embassy_executor::task]
async fn uart_tx_task(tx: UartTx<'static, Async>) {
    write_status_lines(tx, &STATUS_LINES).await
}

/// Control task - arms the ESC, then runs the control cycle.
#[embassy_executor::task]
async fn control_task(mut controller: Controller) {
    controller.stop_all();
    info!("outputs neutral, arming ESC for {} ms", ESC_ARMING_MS);
    Timer::after_millis(ESC_ARMING_MS).await;

    controller.announce(&StatusLine::Ready);
    info!("controller ready, mode undetermined until first mode pulse");

    let mut ticker = Ticker::every(Duration::from_millis(CONTROL_PERIOD_MS));
    loop {
        while let Ok(byte) = RX_BYTES.try_receive() {
            controller.feed_byte(byte);
        }
        controller.step(Instant::now().as_millis());
        ticker.next().await;
    }
}
