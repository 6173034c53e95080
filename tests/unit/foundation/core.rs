use super::*;

#[test]
fn canvas_rejects_zero_dimensions() {
    assert!(Canvas::new(0, 10).is_err());
    assert!(Canvas::new(10, 0).is_err());
    assert!(Canvas::new(1, 1).is_ok());
}

#[test]
fn canvas_default_matches_project_default() {
    let c = Canvas::default();
    assert_eq!(c.width, 922);
    assert_eq!(c.height, 922);
}

#[test]
fn transparent_raster_is_all_zero() {
    let r = Raster::transparent(Canvas::new(3, 2).unwrap()).unwrap();
    assert_eq!(r.data.len(), 3 * 2 * 4);
    assert!(r.data.iter().all(|&b| b == 0));
}

#[test]
fn from_rgba8_checks_length() {
    assert!(Raster::from_rgba8(2, 2, vec![0; 15]).is_err());
    assert!(Raster::from_rgba8(2, 2, vec![0; 16]).is_ok());
}

#[test]
fn pixel_reads_row_major() {
    let mut data = vec![0u8; 2 * 2 * 4];
    data[12..16].copy_from_slice(&[1, 2, 3, 4]);
    let r = Raster::from_rgba8(2, 2, data).unwrap();
    assert_eq!(r.pixel(1, 1), Some([1, 2, 3, 4]));
    assert_eq!(r.pixel(2, 0), None);
}
