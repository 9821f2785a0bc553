pub mod icons;
pub mod output;
pub mod table;
pub mod theme;

pub use icons::Icons;
pub use output::{banner, failure, fallback, faint, field, ident_field, persisted, record_heading};
pub use table::{TableBuilder, params_table};
pub use theme::{theme, Theme};
