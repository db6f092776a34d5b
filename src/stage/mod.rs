mod cell;
mod shared;
mod traits;

pub(crate) use self::cell::StageCell;
pub(crate) use self::shared::SharedStage;
pub(crate) use self::shared::StepMode;
pub(crate) use self::shared::is_void;
pub(crate) use self::traits::StageReceiver;
pub(crate) use self::traits::StageSender;
