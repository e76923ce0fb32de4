pub mod flash;

use core::fmt;

use embassy_time::Duration;
use enum_ordinalize::Ordinalize;

use crate::lights::{Lamp, LightVector};
use crate::rig::Buzzer;
pub use flash::PedestrianFlash;

/// One phase of the cycle, numbered 1 to 6 in running order.
#[derive(Ordinalize, Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum StageId {
    MainGreen = 1,
    MainAmber,
    AllRed,
    SideGreen,
    PedestrianFlash,
    Clearance,
}

impl StageId {
    pub fn number(self) -> u8 {
        self.ordinal()
    }

    /// The auxiliary output held on while this stage runs.
    pub fn buzzer(self) -> Option<Buzzer> {
        match self {
            StageId::SideGreen => Some(Buzzer::Crossing),
            StageId::PedestrianFlash => Some(Buzzer::Closing),
            StageId::MainGreen | StageId::MainAmber | StageId::AllRed | StageId::Clearance => {
                None
            }
        }
    }

    /// Stages that are held longer while a vehicle is close to the line.
    pub fn extends_for_near_vehicle(self) -> bool {
        matches!(self, StageId::MainAmber | StageId::PedestrianFlash)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct InvalidStageId(pub u8);

impl fmt::Display for InvalidStageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "no stage {}, stages run 1 to 6", self.0)
    }
}

impl TryFrom<u8> for StageId {
    type Error = InvalidStageId;

    fn try_from(number: u8) -> Result<Self, Self::Error> {
        StageId::from_ordinal(number).ok_or(InvalidStageId(number))
    }
}

impl fmt::Display for StageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Stage {}", self.number())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stage {
    pub id: StageId,
    /// Nominal length; the runner may extend it.
    pub duration: Duration,
    pub lights: LightVector,
}

impl Stage {
    /// The pedestrian stage times itself with a flash sequence that must run
    /// before its lights are handed to the runner.
    pub fn flash(&self) -> Option<PedestrianFlash> {
        match self.id {
            StageId::PedestrianFlash => Some(PedestrianFlash::new(self.lights)),
            _ => None,
        }
    }
}

pub fn select_stage(id: StageId) -> Stage {
    match id {
        StageId::MainGreen => stage(id, 30, &[Lamp::SideRed, Lamp::MainGreen]),
        StageId::MainAmber => stage(id, 3, &[Lamp::SideRed, Lamp::MainAmber]),
        StageId::AllRed => stage(id, 3, &[Lamp::SideRed, Lamp::MainRed]),
        StageId::SideGreen => stage(
            id,
            30,
            &[Lamp::PedestrianWalk, Lamp::SideGreen, Lamp::MainRed],
        ),
        StageId::PedestrianFlash => stage(
            id,
            0,
            &[Lamp::PedestrianWalk, Lamp::SideAmber, Lamp::MainRed],
        ),
        StageId::Clearance => stage(id, 3, &[Lamp::SideRed, Lamp::MainRed]),
    }
}

fn stage(id: StageId, secs: u64, lamps: &[Lamp]) -> Stage {
    Stage {
        id,
        duration: Duration::from_secs(secs),
        lights: LightVector::lit(lamps),
    }
}
