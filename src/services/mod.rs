/// MPRIS media player mirroring and control.
pub mod mpris;
