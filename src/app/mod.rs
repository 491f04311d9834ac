// Application layer: the table filters, one module per command-line tool.

pub mod filters;
