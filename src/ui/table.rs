use crate::storage::DbStats;
use tabled::settings::object::Columns;
use tabled::settings::{Alignment, Style};
use tabled::{Table, Tabled};

#[derive(Tabled)]
struct TableCountRow {
    #[tabled(rename = "Table")]
    table: String,
    #[tabled(rename = "Rows")]
    rows: usize,
}

/// Row counts per table, with a total line
pub fn stats_table(stats: &DbStats) -> String {
    let mut rows: Vec<TableCountRow> = stats
        .tables
        .iter()
        .map(|t| TableCountRow { table: format!("{}{}", stats.prefix, t.name), rows: t.rows })
        .collect();
    rows.push(TableCountRow { table: "total".to_string(), rows: stats.total_rows() });

    Table::new(&rows).with(Style::rounded()).modify(Columns::single(1), Alignment::right()).to_string()
}

/// Two-column key/value table
pub fn key_value_table(pairs: &[(&str, String)]) -> String {
    let mut builder = tabled::builder::Builder::default();
    for (key, value) in pairs {
        builder.push_record([key.to_string(), value.clone()]);
    }
    builder.build().with(Style::rounded()).to_string()
}
