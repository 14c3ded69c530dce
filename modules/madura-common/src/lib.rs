pub mod config;
pub mod display;
pub mod envelope;
pub mod error;
pub mod filter;
pub mod ids;
pub mod literal;
pub mod types;
pub mod view_state;

pub use config::Config;
pub use display::{display_value, extract_lote_number, format_batch_display};
pub use envelope::{extract_data_array, extract_data_object};
pub use error::{MaduraError, Result};
pub use filter::{filter_lotes, filter_maduradores, Indexed};
pub use ids::{is_object_id, placeholder_object_id};
pub use literal::{parse_literal, to_literal, LiteralError};
pub use types::*;
pub use view_state::ViewState;
