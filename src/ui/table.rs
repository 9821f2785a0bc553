use tabled::{settings::Style, Table, Tabled};

#[derive(Tabled)]
pub struct TableRow {
    #[tabled(rename = "Key")]
    pub key: String,
    #[tabled(rename = "Value")]
    pub value: String,
}

#[derive(Default)]
pub struct TableBuilder {
    rows: Vec<TableRow>,
}

impl TableBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_row(&mut self, key: &str, value: &str) {
        self.rows.push(TableRow {
            key: key.to_string(),
            value: value.to_string(),
        });
    }

    pub fn build(&self) -> String {
        if self.rows.is_empty() {
            return String::new();
        }

        Table::new(&self.rows).with(Style::rounded()).to_string()
    }
}

/// Two-column key/value table, rows in the given order
pub fn params_table<'a>(rows: impl IntoIterator<Item = (&'a str, String)>) -> String {
    let mut builder = TableBuilder::new();
    for (key, value) in rows {
        builder.add_row(key, &value);
    }
    builder.build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_table_renders_nothing() {
        assert!(TableBuilder::new().build().is_empty());
    }

    #[test]
    fn test_rows_rendered() {
        let out = params_table([("name", "\"foo\"".to_string())]);
        assert!(out.contains("name"));
        assert!(out.contains("\"foo\""));
        assert!(out.contains("Key"));
    }
}
