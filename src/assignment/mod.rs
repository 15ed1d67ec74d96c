pub mod roles;
pub mod groups;
pub mod store;
pub mod engine;
pub mod session;

pub use groups::{Slot, SlotModel};
pub use session::{ChangeListener, RosterEntry, Session};
pub use store::{AssignmentStore, Assignments};
