// Fixture-driven end-to-end: listing HTML -> detail HTML -> records -> CSV.

use std::{fs, path::PathBuf};

use idds::{
    extract::{self, Selectors},
    output::{self, VariableRecord},
};

const LISTING: &str = r##"<html><body>
    <table><tr><td><a href="#">Home</a></td><td>Data Dictionary</td></tr></table>
    <table>
        <tr><th>Variable Name</th><th>Description</th><th>Type</th></tr>
        <tr><td><a href="#">ADMDATE</a></td><td>Admission date</td><td>Date</td></tr>
        <tr><td><a href="#">DISCHDATE</a></td><td>Discharge date</td><td>Date</td></tr>
        <tr><td><a href="#">HCN_ENC</a></td><td>Encoded health card</td><td>Char</td></tr>
    </table>
</body></html>"##;

const DETAIL: &str = r"<html><body><table>
    <tr><td>Label</td><td>Portal label</td></tr>
    <tr><td>Type Length</td><td>8</td></tr>
    <tr><td>Available In</td><td>DAD</td></tr>
    <tr><td>Format</td><td>YYYYMMDD</td></tr>
    <tr><td>Value</td><td>n/a</td></tr>
    <tr><td>Links</td><td>none</td></tr>
</table></body></html>";

fn scrape_fixture() -> Vec<VariableRecord> {
    let sel = Selectors::default();

    extract::collect_variables(LISTING, &sel)
        .into_iter()
        .map(|variable| {
            let detail = extract::detail_fields(DETAIL, &sel);
            VariableRecord {
                variable_name: variable.name,
                main_description: variable.description,
                main_type: variable.data_type,
                label: detail.label,
                type_length: detail.type_length,
                available_in: detail.available_in,
                format: detail.format,
                value: detail.value,
                links: detail.links,
            }
        })
        .collect()
}

fn temp_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("idds-{}-{name}", std::process::id()))
}

#[test]
fn fixture_listing_yields_header_plus_one_row_per_variable() {
    let records = scrape_fixture();
    assert_eq!(records.len(), 3);

    let path = temp_path("count.csv");
    output::write_csv(&path, &records).unwrap();
    let written = fs::read_to_string(&path).unwrap();
    fs::remove_file(&path).ok();

    let lines: Vec<&str> = written.lines().collect();
    assert_eq!(lines.len(), 4, "header + one line per variable");
    assert_eq!(lines[0], output::COLUMNS.join(","));
    assert!(lines[1].starts_with("ADMDATE,Admission date,Date,"));
    assert!(lines[3].starts_with("HCN_ENC,"));
}

#[test]
fn empty_scrape_still_writes_the_header() {
    let path = temp_path("empty.csv");
    output::write_csv(&path, &[]).unwrap();
    let written = fs::read_to_string(&path).unwrap();
    fs::remove_file(&path).ok();

    assert_eq!(written.lines().count(), 1);
    assert_eq!(written.lines().next().unwrap(), output::COLUMNS.join(","));
}

#[test]
fn rerun_over_the_same_fixture_is_byte_identical() {
    let records = scrape_fixture();

    let first = temp_path("first.csv");
    let second = temp_path("second.csv");
    output::write_csv(&first, &records).unwrap();
    output::write_csv(&second, &records).unwrap();

    let a = fs::read(&first).unwrap();
    let b = fs::read(&second).unwrap();
    fs::remove_file(&first).ok();
    fs::remove_file(&second).ok();

    assert!(!a.is_empty());
    assert_eq!(a, b);
}

#[test]
fn multiline_values_survive_the_csv_round_trip() {
    let mut records = scrape_fixture();
    records[0].value = "0 = no\n1 = yes".to_owned();

    let path = temp_path("multiline.csv");
    output::write_csv(&path, &records).unwrap();

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_path(&path)
        .unwrap();
    let rows: Vec<csv::StringRecord> = reader.records().map(Result::unwrap).collect();
    fs::remove_file(&path).ok();

    assert_eq!(rows.len(), 3);
    assert_eq!(&rows[0][7], "0 = no\n1 = yes");
}
