/*
 * The I/O module for the crossing.
 *
 * This is the only part of the firmware that knows about the DESPI-M02 pins.
 * `Board` implements the engine's `Rig` on top of them, `Console` and
 * `LineReader` are the two halves of the USART1 operator console, and
 * `edge_task` turns the button and slide switch edges into `InputEvent`s.
 */

use core::fmt::{Display, Write};

use crossing::config::OUT_OF_RANGE_CM;
use crossing::inputs::{EventSender, InputEvent};
use crossing::{Buzzer, LightVector, Notice, Ranging, Rig, ShiftRegister};
use defmt::{debug, warn};
use embassy_futures::select::{Either, select};
use embassy_stm32::exti::ExtiInput;
use embassy_stm32::gpio::{Level, Output};
use embassy_stm32::mode::Async;
use embassy_stm32::usart::{UartRx, UartTx};
use embassy_time::{Duration, Instant, Timer, with_timeout};
use heapless::String;

pub const LINE_LENGTH: usize = 32;
const CONSOLE_LINE: usize = 160;

// An echo longer than this is past the sensor's range.
const ECHO_TIMEOUT: Duration = Duration::from_millis(30);
const TRIGGER_PULSE: Duration = Duration::from_micros(10);
// Speed of sound in cm per microsecond, halved for the round trip.
const CM_PER_ECHO_MICRO: f32 = 0.0343 / 2.0;

const ETX: u8 = 0x03;

pub struct Console {
    tx: UartTx<'static, Async>,
}

impl Console {
    pub fn new(tx: UartTx<'static, Async>) -> Self {
        Self { tx }
    }

    pub async fn say(&mut self, message: impl Display) {
        let mut line: String<CONSOLE_LINE> = String::new();
        // too long a line is cut short rather than dropped
        let _ = write!(line, "{message}\r\n");
        if self.tx.write(line.as_bytes()).await.is_err() {
            warn!("console write failed");
        }
    }

    pub async fn write_str(&mut self, text: &str) {
        if self.tx.write(text.as_bytes()).await.is_err() {
            warn!("console write failed");
        }
    }
}

pub struct LineReader {
    rx: UartRx<'static, Async>,
}

impl LineReader {
    pub fn new(rx: UartRx<'static, Async>) -> Self {
        Self { rx }
    }

    /// Next line typed by the operator, without its terminator. Characters
    /// past `LINE_LENGTH` are dropped.
    pub async fn read_line(&mut self) -> String<LINE_LENGTH> {
        let mut line = String::new();
        let mut byte = [0u8; 1];
        loop {
            if self.rx.read(&mut byte).await.is_err() {
                warn!("console read failed");
                continue;
            }
            match byte[0] {
                b'\r' | b'\n' if line.is_empty() => {}
                b'\r' | b'\n' => return line,
                c if c.is_ascii() => {
                    let _ = line.push(char::from(c));
                }
                _ => {}
            }
        }
    }

    /// Forwards a `q` or Ctrl-C as a cancel request. Runs alongside normal
    /// operation and is dropped when it ends.
    pub async fn watch_for_cancel(&mut self, events: EventSender<'static>) -> ! {
        let mut byte = [0u8; 1];
        loop {
            match self.rx.read(&mut byte).await {
                Ok(()) if byte[0] == b'q' || byte[0] == ETX => {
                    events.send(InputEvent::Cancel).await;
                }
                Ok(()) => {}
                Err(_) => warn!("console read failed"),
            }
        }
    }
}

/*
 * HC-SR04: a 10 us trigger pulse, then the echo line stays high for as long
 * as the sound took to come back.
 */
pub struct Sonar {
    trigger: Output<'static>,
    echo: ExtiInput<'static>,
}

impl Sonar {
    pub fn new(trigger: Output<'static>, echo: ExtiInput<'static>) -> Self {
        Self { trigger, echo }
    }

    async fn measure(&mut self) -> Ranging {
        let started = Instant::now();
        self.trigger.set_high();
        Timer::after(TRIGGER_PULSE).await;
        self.trigger.set_low();

        let echo = &mut self.echo;
        let pulse = with_timeout(ECHO_TIMEOUT, async {
            echo.wait_for_high().await;
            let rise = Instant::now();
            echo.wait_for_low().await;
            rise.elapsed()
        })
        .await;

        let distance_cm = match pulse {
            Ok(width) => width.as_micros() as f32 * CM_PER_ECHO_MICRO,
            Err(_) => {
                debug!("no echo within {} ms", ECHO_TIMEOUT.as_millis());
                OUT_OF_RANGE_CM
            }
        };

        Ranging {
            distance_cm,
            latency: started.elapsed(),
        }
    }
}

pub struct Board {
    lights: ShiftRegister<Output<'static>>,
    crossing_buzzer: Output<'static>,
    closing_buzzer: Output<'static>,
    sonar: Sonar,
    console: Console,
}

impl Board {
    pub fn new(
        lights: ShiftRegister<Output<'static>>,
        crossing_buzzer: Output<'static>,
        closing_buzzer: Output<'static>,
        sonar: Sonar,
        console: Console,
    ) -> Self {
        Self {
            lights,
            crossing_buzzer,
            closing_buzzer,
            sonar,
            console,
        }
    }

    pub fn console(&mut self) -> &mut Console {
        &mut self.console
    }
}

impl Rig for Board {
    fn set_lights(&mut self, lights: LightVector) {
        // GPIO outputs cannot fail
        let Ok(()) = self.lights.write(lights);
    }

    fn set_buzzer(&mut self, buzzer: Buzzer, on: bool) {
        let output = match buzzer {
            Buzzer::Crossing => &mut self.crossing_buzzer,
            Buzzer::Closing => &mut self.closing_buzzer,
        };
        output.set_level(Level::from(on));
    }

    async fn range(&mut self) -> Ranging {
        self.sonar.measure().await
    }

    async fn notify(&mut self, notice: Notice) {
        debug!("{}", notice);
        self.console.say(notice).await;
    }
}

#[embassy_executor::task]
pub async fn edge_task(
    mut button: ExtiInput<'static>,
    mut switch: ExtiInput<'static>,
    events: EventSender<'static>,
) -> ! {
    // a switch that is already on at boot counts as an edge
    if switch.is_high() {
        events
            .send(InputEvent::Switch {
                on: true,
                at: Instant::now(),
            })
            .await;
    }

    loop {
        let event = match select(button.wait_for_any_edge(), switch.wait_for_any_edge()).await {
            // the button pulls its input low
            Either::First(()) => InputEvent::Button {
                pressed: button.is_low(),
                at: Instant::now(),
            },
            Either::Second(()) => InputEvent::Switch {
                on: switch.is_high(),
                at: Instant::now(),
            },
        };
        events.send(event).await;
    }
}
