pub mod maybe_owned;
pub mod user_counter;
