#![no_std]
#![no_main]

// https://dev.to/theembeddedrustacean/embedded-rust-embassy-gpio-button-controlled-blinking-3ee6
// https://www.youtube.com/watch?v=dab_vzVDr_M

use core::future::pending;

use crossing::config::OperatorConfig;
use crossing::history::Series;
use crossing::inputs::EventChannel;
use crossing::operator::{
    Lockout, MENU, MenuChoice, OBSERVATION_MENU, PinGate, PinOutcome, parse_observation,
};
use crossing::{
    ControlInputs, Controller, LightVector, PollingInterval, Rig, ShiftRegister, SystemClock,
};
use defmt::{error, info, warn};
use defmt_rtt as _;
use embassy_executor::Spawner;
use embassy_futures::select::{Either, select};
use embassy_stm32::exti::ExtiInput;
use embassy_stm32::gpio::{Level, Output, Pull, Speed};
use embassy_stm32::usart::{Config, Uart};
use embassy_stm32::{bind_interrupts, peripherals, usart};
use embassy_sync::channel::Channel;
use embassy_time::Timer;
use panic_halt as _;

mod io;
use io::{Board, LineReader, Sonar};

static INPUT_EVENTS: EventChannel = Channel::new();

type Crossing = Controller<'static, Board, SystemClock>;

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    let peripherals = embassy_stm32::init(Default::default());

    bind_interrupts!(struct Irqs {
        USART1 => usart::InterruptHandler<peripherals::USART1>;
    });
    let Ok(usart) = Uart::new(
        peripherals.USART1,
        peripherals.PA10,
        peripherals.PA9,
        Irqs,
        peripherals.DMA1_CH4,
        peripherals.DMA1_CH5,
        Config::default(), // 115200 baud
    ) else {
        error!("USART1 could not be configured");
        return;
    };
    let (tx, rx) = usart.split();
    let mut reader = LineReader::new(rx);

    // the on-board LED is active-low, lit once we are up
    let _status_led = Output::new(peripherals.PE12, Level::Low, Speed::Low);

    let lights = ShiftRegister::new(
        Output::new(peripherals.PB10, Level::Low, Speed::Low),
        Output::new(peripherals.PB12, Level::Low, Speed::Low),
        Output::new(peripherals.PB14, Level::Low, Speed::Low),
    );
    let sonar = Sonar::new(
        Output::new(peripherals.PA0, Level::Low, Speed::Low),
        ExtiInput::new(peripherals.PA1, peripherals.EXTI1, Pull::Down),
    );
    let board = Board::new(
        lights,
        Output::new(peripherals.PB6, Level::Low, Speed::Low),
        Output::new(peripherals.PB8, Level::Low, Speed::Low),
        sonar,
        io::Console::new(tx),
    );

    let button = ExtiInput::new(peripherals.PE11, peripherals.EXTI11, Pull::Up);
    let switch = ExtiInput::new(peripherals.PE10, peripherals.EXTI10, Pull::Down);
    if spawner
        .spawn(io::edge_task(button, switch, INPUT_EVENTS.sender()))
        .is_err()
    {
        warn!("edge task not started, button and switch are ignored");
    }

    let mut controller = Controller::new(
        board,
        SystemClock,
        ControlInputs::new(INPUT_EVENTS.receiver()),
    );
    let mut interval = PollingInterval::default();
    let mut gate = PinGate::new(OperatorConfig::default());
    let secs = interval.secs();
    info!("crossing controller up, polling every {} s", secs);

    loop {
        controller.rig().set_lights(LightVector::standby(true));
        controller.rig().console().write_str(MENU).await;

        let choice = match reader.read_line().await.parse::<MenuChoice>() {
            Ok(choice) => choice,
            Err(e) => {
                controller.rig().console().say(e).await;
                continue;
            }
        };
        info!("menu: {}", choice);

        match choice {
            MenuChoice::NormalOperation => {
                let reason = match select(
                    controller.run(interval),
                    reader.watch_for_cancel(INPUT_EVENTS.sender()),
                )
                .await
                {
                    Either::First(reason) => reason,
                    Either::Second(never) => never,
                };
                info!("back to the menu after: {}", reason);
            }
            MenuChoice::DataObservation => observe(&mut controller, &mut reader, interval).await,
            MenuChoice::Adjustment => {
                if unlock(&mut controller, &mut reader, &mut gate).await {
                    interval = adjust_interval(&mut controller, &mut reader).await;
                }
            }
            MenuChoice::Quit => break,
        }
    }

    controller.rig().set_lights(LightVector::DARK);
    controller.rig().console().say("Goodbye").await;
    info!("operator quit, parked");
    pending::<()>().await;
}

async fn observe(controller: &mut Crossing, reader: &mut LineReader, interval: PollingInterval) {
    loop {
        controller.rig().console().write_str(OBSERVATION_MENU).await;
        let series = match parse_observation(&reader.read_line().await) {
            Ok(Some(series)) => series,
            Ok(None) => return,
            Err(e) => {
                controller.rig().console().say(e).await;
                continue;
            }
        };

        let points = match controller.history().observe(series, interval) {
            Ok(points) => points,
            Err(e) => {
                controller.rig().console().say(e).await;
                continue;
            }
        };
        for point in points {
            let (secs, value) = (point.elapsed_secs, point.value);
            controller
                .rig()
                .console()
                .say(format_args!("{secs:>4} s  {value}"))
                .await;
        }
        let dropped = controller.history().dropped_tallies();
        if let (Series::Pedestrians, Some(dropped)) = (series, dropped) {
            controller.rig().console().say(dropped).await;
        }
    }
}

async fn unlock(controller: &mut Crossing, reader: &mut LineReader, gate: &mut PinGate) -> bool {
    loop {
        controller
            .rig()
            .console()
            .write_str("Enter PIN (or quit): ")
            .await;
        let outcome = gate.submit(&reader.read_line().await);
        controller.rig().console().say(outcome).await;

        match outcome {
            PinOutcome::Granted => return true,
            PinOutcome::Quit => return false,
            PinOutcome::Rejected { .. } => {}
            PinOutcome::LockedOut => {
                warn!("adjustment locked out");
                sit_out(controller, gate.lockout()).await;
                return false;
            }
        }
    }
}

async fn sit_out(controller: &mut Crossing, lockout: Lockout) {
    for tick in lockout {
        let remaining = tick.remaining_secs;
        controller.rig().set_lights(tick.lights);
        controller
            .rig()
            .console()
            .say(format_args!("Locked out, {remaining} s remaining"))
            .await;
        Timer::after(Lockout::TICK).await;
    }
}

async fn adjust_interval(controller: &mut Crossing, reader: &mut LineReader) -> PollingInterval {
    loop {
        controller
            .rig()
            .console()
            .write_str("Enter polling interval, 1 to 5 seconds: ")
            .await;
        match reader.read_line().await.parse::<PollingInterval>() {
            Ok(interval) => {
                controller.polling_interval_changed(interval);
                controller
                    .rig()
                    .console()
                    .say(format_args!("Polling every {} s", interval))
                    .await;
                info!("polling interval now {} s", interval.secs());
                return interval;
            }
            Err(e) => controller.rig().console().say(e).await,
        }
    }
}
