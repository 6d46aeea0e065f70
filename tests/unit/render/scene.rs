use super::*;
use crate::data::dataset::DatasetVariant;
use crate::map::projection::GeoExtent;

const SAMPLE: &str = "\
Province/State,Country/Region,Lat,Long,1/22/20,1/23/20
Hubei,China,30.9756,112.2707,444,1000
Beijing,China,40.1824,116.4142,14,22
,Japan,36.0,138.0,0,2
,R&D Land,10.0,10.0,-3,1234567
";

fn fixture() -> (CaseTable, MercatorProjection) {
    let table = CaseTable::from_reader(SAMPLE.as_bytes()).unwrap();
    let projection = MercatorProjection::new(GeoExtent::default(), Canvas::default()).unwrap();
    (table, projection)
}

#[test]
fn thousands_separators() {
    assert_eq!(format_thousands(0), "0");
    assert_eq!(format_thousands(999), "999");
    assert_eq!(format_thousands(1000), "1,000");
    assert_eq!(format_thousands(1234567), "1,234,567");
    assert_eq!(format_thousands(-45000), "-45,000");
}

#[test]
fn marker_area_scales_with_count() {
    let style = MapStyle::default();
    assert_eq!(style.marker_radius_px(0, 0.1), 0.0);
    // 1000 cases * 0.1 = 100 pt^2 -> 10pt diameter -> 13.89px -> radius 6.94px.
    let r = style.marker_radius_px(1000, 0.1);
    assert!((r - 10.0 * 100.0 / 72.0 / 2.0).abs() < 1e-9);
    let r4 = style.marker_radius_px(4000, 0.1);
    assert!((r4 - 2.0 * r).abs() < 1e-9);
}

#[test]
fn only_positive_counts_get_markers() {
    let (table, projection) = fixture();
    let variant = DatasetVariant::Confirmed.config();
    let style = MapStyle::default();

    let day0 = FrameScene::build(&table, FrameIndex(0), &variant, &projection, &style).unwrap();
    assert_eq!(day0.markers.len(), 2);
    let hubei = projection.project(112.2707, 30.9756);
    assert_eq!(day0.markers[0].center, hubei);

    let day1 = FrameScene::build(&table, FrameIndex(1), &variant, &projection, &style).unwrap();
    assert_eq!(day1.markers.len(), 4);
}

#[test]
fn scene_carries_date_total_and_ranking() {
    let (table, projection) = fixture();
    let variant = DatasetVariant::Active.config();
    let scene = FrameScene::build(
        &table,
        FrameIndex(1),
        &variant,
        &projection,
        &MapStyle::default(),
    )
    .unwrap();

    assert_eq!(scene.date, NaiveDate::from_ymd_opt(2020, 1, 23).unwrap());
    assert_eq!(scene.total, 1000 + 22 + 2 + 1234567);
    assert_eq!(scene.ranking[0].country, "R&D Land");
    assert_eq!(scene.ranking[1].country, "China");
    assert_eq!(scene.ranking[1].count, 1022);

    assert_eq!(scene.texts[0].text, "Jan 23, 2020");
    assert_eq!(scene.texts[1].text, "ACTIVE");
    assert_eq!(scene.texts[2].text, format_thousands(scene.total));
    // Three headline items plus two cells per ranked row.
    assert_eq!(scene.texts.len(), 3 + 2 * scene.ranking.len());
}

#[test]
fn ranked_table_stacks_upward_to_anchor() {
    let (table, projection) = fixture();
    let style = MapStyle::default();
    let scene = FrameScene::build(
        &table,
        FrameIndex(1),
        &DatasetVariant::Confirmed.config(),
        &projection,
        &style,
    )
    .unwrap();

    let rows: Vec<&TextItem> = scene.texts[3..].iter().step_by(2).collect();
    let anchor = projection.project(style.table_anchor.0, style.table_anchor.1);
    let last = rows.last().unwrap();
    assert!((last.pos.y - anchor.y).abs() < 1e-9);
    assert!(rows.windows(2).all(|w| w[0].pos.y < w[1].pos.y));
}

#[test]
fn frame_outside_table_is_an_error() {
    let (table, projection) = fixture();
    assert!(
        FrameScene::build(
            &table,
            FrameIndex(2),
            &DatasetVariant::Confirmed.config(),
            &projection,
            &MapStyle::default(),
        )
        .is_err()
    );
}

#[test]
fn svg_is_canvas_sized_and_escapes_text() {
    let (table, projection) = fixture();
    let scene = FrameScene::build(
        &table,
        FrameIndex(1),
        &DatasetVariant::Confirmed.config(),
        &projection,
        &MapStyle::default(),
    )
    .unwrap();
    let svg = scene.to_svg();

    assert!(svg.starts_with("<svg"));
    assert!(svg.contains(r#"width="1920" height="1080""#));
    assert_eq!(svg.matches("<circle").count(), 4);
    assert!(svg.contains("R&amp;D Land"));
    assert!(!svg.contains("R&D"));
    assert!(svg.contains(r##"fill="#ff6600""##));

    let r = crate::render::svg_raster::SvgRasterizer::new(None);
    r.parse(&svg).unwrap();
}
