pub mod booking;
pub mod conversation;
pub mod intent;
pub mod profile;

pub use booking::Booking;
pub use conversation::{ConversationState, Session, SlotContext, DEFAULT_LANGUAGE};
pub use intent::{ExtractedSlots, Intent};
pub use profile::{BusinessProfile, ClinicInfo, Faq, Service};
