pub mod grep_rows;
pub mod merge_tables;
pub mod normalize;
pub mod random_table;
pub mod report;
pub mod subsample;
pub mod transpose;
pub mod vitals;
