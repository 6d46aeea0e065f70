use super::*;

const SAMPLE: &str = "\
Province/State,Country/Region,Lat,Long,1/22/20,1/23/20,1/24/20
Hubei,China,30.9756,112.2707,444,444,549
Beijing,China,40.1824,116.4142,14,22,36
,Japan,36.0,138.0,2,1,2
,Italy,43.0,12.0,0,0,
Diamond Princess,Others,35.4437,139.638,,,61.0
";

fn sample() -> CaseTable {
    CaseTable::from_reader(SAMPLE.as_bytes()).unwrap()
}

#[test]
fn parses_dates_keys_and_counts() {
    let t = sample();
    assert_eq!(t.len_dates(), 3);
    assert_eq!(
        t.dates[0],
        NaiveDate::from_ymd_opt(2020, 1, 22).unwrap()
    );
    assert_eq!(t.rows.len(), 5);
    assert_eq!(t.rows[0].key.province, "Hubei");
    assert_eq!(t.rows[0].key.country, "China");
    assert!((t.rows[0].key.lon - 112.2707).abs() < 1e-9);
    assert_eq!(t.rows[2].key.province, "");
    assert_eq!(t.rows[3].counts, vec![0, 0, 0]);
    assert_eq!(t.rows[4].counts, vec![0, 0, 61]);
}

#[test]
fn bad_date_header_is_a_data_error() {
    let csv = "Province/State,Country/Region,Lat,Long,not-a-date\n,X,0,0,1\n";
    let err = CaseTable::from_reader(csv.as_bytes()).unwrap_err();
    assert!(err.to_string().contains("data error:"));
}

#[test]
fn bad_count_is_a_data_error() {
    let csv = "Province/State,Country/Region,Lat,Long,1/22/20\n,X,0,0,lots\n";
    assert!(CaseTable::from_reader(csv.as_bytes()).is_err());
}

#[test]
fn column_total_sums_every_row() {
    let t = sample();
    assert_eq!(t.column_total(FrameIndex(0)), 444 + 14 + 2);
    assert_eq!(t.column_total(FrameIndex(2)), 549 + 36 + 2 + 61);
    assert_eq!(t.column_total(FrameIndex(9)), 0);
}

#[test]
fn top_countries_groups_by_country_and_sorts_descending() {
    let t = sample();
    let top = t.top_countries(FrameIndex(2), 10);
    assert_eq!(top[0], RankedEntry { country: "China".into(), count: 585 });
    assert_eq!(top[1].country, "Others");
    assert_eq!(top[2].country, "Japan");
    assert_eq!(top[3], RankedEntry { country: "Italy".into(), count: 0 });
    assert_eq!(top.len(), 4);

    let top1 = t.top_countries(FrameIndex(2), 1);
    assert_eq!(top1.len(), 1);
}

#[test]
fn top_countries_ties_keep_name_order() {
    let t = sample();
    // Day 0: Italy and Others are both zero.
    let top = t.top_countries(FrameIndex(0), 10);
    let names: Vec<_> = top.iter().map(|e| e.country.as_str()).collect();
    assert_eq!(names, ["China", "Japan", "Italy", "Others"]);
}

#[test]
fn date_at_rejects_out_of_range_frames() {
    let t = sample();
    assert_eq!(
        t.date_at(FrameIndex(1)).unwrap(),
        NaiveDate::from_ymd_opt(2020, 1, 23).unwrap()
    );
    assert!(t.date_at(FrameIndex(3)).is_err());
}

#[test]
fn new_rejects_ragged_rows() {
    let key = LocationKey {
        province: String::new(),
        country: "X".into(),
        lat: 0.0,
        lon: 0.0,
    };
    let dates = vec![NaiveDate::from_ymd_opt(2020, 1, 22).unwrap()];
    let rows = vec![LocationRow {
        key,
        counts: vec![1, 2],
    }];
    assert!(CaseTable::new(dates, rows).is_err());
}
