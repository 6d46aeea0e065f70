use super::*;

#[test]
fn canvas_rejects_zero_dimensions() {
    assert!(Canvas::new(0, 10).is_err());
    assert!(Canvas::new(10, 0).is_err());
    assert_eq!(Canvas::new(4, 2).unwrap(), Canvas { width: 4, height: 2 });
    assert_eq!(Canvas::default().width, 1920);
}

#[test]
fn parses_hex_rgb_and_rgba() {
    assert_eq!(Rgba8::from_hex("#ff6600").unwrap(), Rgba8::rgb(255, 102, 0));
    assert_eq!(
        Rgba8::from_hex("0000FF80").unwrap(),
        Rgba8 {
            r: 0,
            g: 0,
            b: 255,
            a: 128
        }
    );
    assert!(Rgba8::from_hex("#fff").is_err());
    assert!(Rgba8::from_hex("#gg0000").is_err());
}

#[test]
fn svg_paint_uses_lowercase_hex_and_opacity() {
    let (fill, opacity) = Rgba8::rgb(255, 102, 0).with_opacity(0.8).to_svg();
    assert_eq!(fill, "#ff6600");
    assert!((opacity - 204.0 / 255.0).abs() < 1e-9);
}

#[test]
fn unpremultiply_restores_straight_alpha() {
    let mut px = vec![64, 32, 0, 128, 10, 10, 10, 0, 1, 2, 3, 255];
    unpremultiply_in_place(&mut px);
    assert_eq!(&px[0..4], &[128, 64, 0, 128]);
    assert_eq!(&px[4..8], &[0, 0, 0, 0]);
    assert_eq!(&px[8..12], &[1, 2, 3, 255]);
}
