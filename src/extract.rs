use scraper::{ElementRef, Html, Selector};

use crate::text::flatten_cell;

/// Pre-parsed selectors for the portal's two table layouts: the dataset
/// variables listing and the per-variable label/value detail view.
pub struct Selectors {
    table: Selector,
    row: Selector,
    detail_row: Selector,
    cell: Selector,
    header_cell: Selector,
    link: Selector,
}

impl Default for Selectors {
    fn default() -> Self {
        Self {
            table: Selector::parse("table").unwrap(),
            row: Selector::parse("tbody tr").unwrap(),
            detail_row: Selector::parse("table tr").unwrap(),
            cell: Selector::parse("td").unwrap(),
            header_cell: Selector::parse("th").unwrap(),
            link: Selector::parse("a").unwrap(),
        }
    }
}

/// One row of the variables listing, before its detail view is visited.
#[derive(Debug)]
pub struct VariableSummary {
    pub name: String,
    pub description: String,
    pub data_type: String,
}

/// Detail-view fields; a row absent from the page stays empty.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct DetailFields {
    pub label: String,
    pub type_length: String,
    pub available_in: String,
    pub format: String,
    pub value: String,
    pub links: String,
}

/// Rows of the first table whose text mentions "Variable Name". Header rows
/// and rows whose first cell carries no link are skipped; the listing shares
/// its page with navigation tables that would otherwise pollute the result.
pub fn collect_variables(page: &str, sel: &Selectors) -> Vec<VariableSummary> {
    let html = Html::parse_document(page);

    let Some(listing) = html
        .select(&sel.table)
        .find(|table| table.text().any(|chunk| chunk.contains("Variable Name")))
    else {
        return Vec::new();
    };

    listing
        .select(&sel.row)
        .filter_map(|row| {
            if row.select(&sel.header_cell).next().is_some() {
                return None;
            }

            let cells: Vec<ElementRef<'_>> = row.select(&sel.cell).collect();
            let name_link = cells.first()?.select(&sel.link).next()?;
            let name = flatten_cell(&name_link.inner_html());
            if name.is_empty() {
                return None;
            }

            let text_of = |idx: usize| {
                cells
                    .get(idx)
                    .map(|cell| flatten_cell(&cell.inner_html()))
                    .unwrap_or_default()
            };

            Some(VariableSummary {
                name,
                description: text_of(1),
                data_type: text_of(2),
            })
        })
        .collect()
}

/// The detail view is label/value pairs, one per table row. A later duplicate
/// wins, which re-extraction after expanding "more" widgets relies on.
pub fn detail_fields(page: &str, sel: &Selectors) -> DetailFields {
    let html = Html::parse_document(page);
    let mut fields = DetailFields::default();

    for row in html.select(&sel.detail_row) {
        let mut cells = row.select(&sel.cell);
        let (Some(key), Some(value)) = (cells.next(), cells.next()) else {
            continue;
        };

        let key: String = key.text().map(str::trim).collect();
        let value = flatten_cell(&value.inner_html());

        if key.contains("Label") {
            fields.label = value;
        } else if key.contains("Type Length") {
            fields.type_length = value;
        } else if key.contains("Available In") {
            fields.available_in = value;
        } else if key.contains("Format") {
            fields.format = value;
        } else if key.contains("Value") {
            fields.value = value;
        } else if key.contains("Links") {
            fields.links = value;
        }
    }

    fields
}
