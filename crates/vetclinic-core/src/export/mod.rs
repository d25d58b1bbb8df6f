//! Report exports: CSV files and the printable invoice.

mod csv;
pub mod print;

pub use self::csv::*;
pub use print::render_invoice_html;
