use super::*;

const LIST: [&str; 5] = ["Name", "Id", "Version", "Available", "Source"];
const PINS: [&str; 6] = ["Name", "Id", "Version", "Source", "Pin type", "Pinned version"];

fn rows(output: &str, titles: &[&str]) -> Vec<TableRow> {
    parse_table(output, titles, &["Id", "Version"])
        .expect("parse table")
        .expect("table present")
}

#[test]
fn parses_list_output() {
    let output = "\
Name                 Id                      Version        Available  Source
-------------------------------------------------------------------------------
Git                  Git.Git                 2.43.0         2.44.0     winget
Microsoft Edge       Microsoft.Edge          122.0.2365.92             winget
Local Tool           ARP\\Machine\\X64\\Tool    1.0
";

    let rows = rows(output, &LIST);
    assert_eq!(rows.len(), 3);

    assert_eq!(rows[0].get("Name"), Some("Git"));
    assert_eq!(rows[0].get("Id"), Some("Git.Git"));
    assert_eq!(rows[0].get("Version"), Some("2.43.0"));
    assert_eq!(rows[0].get("Available"), Some("2.44.0"));
    assert_eq!(rows[0].get("Source"), Some("winget"));

    assert_eq!(rows[1].get("Name"), Some("Microsoft Edge"));
    assert_eq!(rows[1].get("Available"), None);

    assert_eq!(rows[2].get("Id"), Some("ARP\\Machine\\X64\\Tool"));
    assert_eq!(rows[2].get("Source"), None);
}

#[test]
fn strips_progress_spinner_before_header() {
    let output = "   - \r   \\ \r   | \rName   Id       Version\r\n\
                  ---------------------\n\
                  Git    Git.Git  2.43.0\n";

    let rows = rows(output, &LIST);
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].get("Id"), Some("Git.Git"));
}

#[test]
fn missing_table_is_none() {
    let output = "No installed package found matching input criteria.\n";
    assert_eq!(parse_table(output, &LIST, &["Id"]).expect("parse"), None);
}

#[test]
fn empty_table_is_some_empty() {
    let output = "Name   Id   Version\n-------------------\n";
    assert_eq!(rows(output, &LIST), Vec::new());
}

#[test]
fn footer_lines_are_dropped() {
    let output = "\
Name      Id                  Version Available Source
------------------------------------------------------
PowerToys Microsoft.PowerToys 0.80.0  0.81.0    winget
1 upgrades available.
";
    let rows = rows(output, &LIST);
    assert_eq!(rows.len(), 1);
}

#[test]
fn second_table_restarts_columns() {
    let output = "\
Name  Id       Version
----------------------
Git   Git.Git  2.43.0

The following packages have an upgrade available, but require explicit targeting for upgrade:
Name     Id           Version
-----------------------------
Spotify  Spotify.App  1.2.3
";
    let rows = rows(output, &LIST);
    let ids: Vec<_> = rows.iter().filter_map(|r| r.get("Id")).collect();
    assert_eq!(ids, vec!["Git.Git", "Spotify.App"]);
}

#[test]
fn parses_pin_list_with_multiword_titles() {
    let output = "\
Name      Id                  Version Source Pin type Pinned version
--------------------------------------------------------------------
PowerToys Microsoft.PowerToys 0.80.0  winget Gating   0.81.*
Node      OpenJS.NodeJS       20.1.0  winget Blocking
";
    let rows = rows(output, &PINS);
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].get("Pin type"), Some("Gating"));
    assert_eq!(rows[0].get("Pinned version"), Some("0.81.*"));
    assert_eq!(rows[1].get("Pin type"), Some("Blocking"));
    assert_eq!(rows[1].get("Pinned version"), None);
}

#[test]
fn header_without_key_column_is_ignored() {
    let output = "Name   Version\n--------------\nGit    2.43.0\n";
    assert_eq!(parse_table(output, &LIST, &["Id"]).expect("parse"), None);
}

#[test]
fn wide_characters_count_as_two_columns() {
    let output = [
        "Name          Id          Version Source",
        "----------------------------------------",
        "日本語ツール  Vendor.JP   1.0     winget",
        "Git           Git.Git     2.43.0  winget",
    ]
    .join("\n");

    let rows = rows(&output, &LIST);
    assert_eq!(rows.len(), 2);

    assert_eq!(rows[0].get("Name"), Some("日本語ツール"));
    assert_eq!(rows[0].get("Id"), Some("Vendor.JP"));
    assert_eq!(rows[0].get("Version"), Some("1.0"));
    assert_eq!(rows[0].get("Source"), Some("winget"));
    assert_eq!(rows[1].get("Id"), Some("Git.Git"));
}
