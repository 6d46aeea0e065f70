use super::*;

fn world() -> MercatorProjection {
    MercatorProjection::new(GeoExtent::default(), Canvas::default()).unwrap()
}

#[test]
fn default_extent_fills_width_and_is_centred_vertically() {
    let p = world();
    let r = p.map_rect();
    assert!(r.x0.abs() < 1e-6);
    assert!((r.x1 - 1920.0).abs() < 1e-6);
    assert!(r.height() < 1080.0);
    assert!((r.y0 - (1080.0 - r.y1)).abs() < 1e-6);
}

#[test]
fn project_unproject_round_trips_inside_extent() {
    let p = world();
    for &(lon, lat) in &[(0.0, 0.0), (112.27, 30.97), (-74.0, 40.7), (150.0, -33.8)] {
        let (lon2, lat2) = p.unproject(p.project(lon, lat));
        assert!((lon - lon2).abs() < 1e-9, "lon {lon} -> {lon2}");
        assert!((lat - lat2).abs() < 1e-9, "lat {lat} -> {lat2}");
    }
}

#[test]
fn north_is_up_and_east_is_right() {
    let p = world();
    let a = p.project(0.0, 0.0);
    assert!(p.project(10.0, 0.0).x > a.x);
    assert!(p.project(0.0, 10.0).y < a.y);
}

#[test]
fn mercator_stretches_high_latitudes() {
    let p = world();
    let y0 = p.project(0.0, 0.0).y;
    let y30 = p.project(0.0, 30.0).y;
    let y60 = p.project(0.0, 60.0).y;
    assert!((y30 - y60) > (y0 - y30));
}

#[test]
fn invalid_extents_are_rejected() {
    let canvas = Canvas::default();
    let flipped = GeoExtent {
        lon_min: 10.0,
        lon_max: -10.0,
        ..GeoExtent::default()
    };
    assert!(MercatorProjection::new(flipped, canvas).is_err());

    let polar = GeoExtent {
        lat_max: 90.0,
        ..GeoExtent::default()
    };
    assert!(MercatorProjection::new(polar, canvas).is_err());
}
