//! Equatorial (FK5 J2000) to galactic coordinate conversion
//!
//! The rotation is assembled from the J2000 position of the north galactic
//! pole and the galactic longitude of the north celestial pole, the same
//! constants the IAU 1958 system is tied to after precession to J2000:
//!
//! `R = Rz(180° - l_ncp) · Ry(90° - δ_ngp) · Rz(α_ngp)`
//!
//! with passive (frame) rotations.

use nalgebra::{Rotation3, Vector3};

/// Right ascension of the north galactic pole, FK5 J2000 (degrees)
const NGP_RA_J2000: f64 = 192.859_481_206_534_8;
/// Declination of the north galactic pole, FK5 J2000 (degrees)
const NGP_DEC_J2000: f64 = 27.128_251_180_856_22;
/// Galactic longitude of the north celestial pole, J2000 (degrees)
const NCP_L_J2000: f64 = 122.931_918_568_002_6;

/// Galactic coordinates in degrees, `l` in [0, 360), `b` in [-90, 90]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Galactic {
    pub l: f64,
    pub b: f64,
}

/// Passive (frame) rotation about the z axis
fn rot_z(deg: f64) -> Rotation3<f64> {
    Rotation3::from_axis_angle(&Vector3::z_axis(), -deg.to_radians())
}

/// Passive (frame) rotation about the y axis
fn rot_y(deg: f64) -> Rotation3<f64> {
    Rotation3::from_axis_angle(&Vector3::y_axis(), -deg.to_radians())
}

/// FK5 J2000 → galactic rotation
pub fn fk5_to_galactic_matrix() -> Rotation3<f64> {
    rot_z(180.0 - NCP_L_J2000) * rot_y(90.0 - NGP_DEC_J2000) * rot_z(NGP_RA_J2000)
}

fn unit_vector(lon_deg: f64, lat_deg: f64) -> Vector3<f64> {
    let (sin_lon, cos_lon) = lon_deg.to_radians().sin_cos();
    let (sin_lat, cos_lat) = lat_deg.to_radians().sin_cos();
    Vector3::new(cos_lat * cos_lon, cos_lat * sin_lon, sin_lat)
}

/// Convert FK5 J2000 (ra, dec) in degrees to galactic (l, b) in degrees
pub fn equatorial_to_galactic(ra: f64, dec: f64) -> Galactic {
    let g = fk5_to_galactic_matrix() * unit_vector(ra, dec);

    let l = g.y.atan2(g.x).to_degrees().rem_euclid(360.0);
    // Clamp guards asin against rounding just past ±1 at the poles
    let b = g.z.clamp(-1.0, 1.0).asin().to_degrees();

    // rem_euclid can return exactly 360.0 for tiny negative inputs
    let l = if l >= 360.0 { 0.0 } else { l };
    Galactic { l, b }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Matrix3;

    /// Angular separation in degrees between two (lon, lat) points
    fn separation(a: (f64, f64), b: (f64, f64)) -> f64 {
        unit_vector(a.0, a.1).angle(&unit_vector(b.0, b.1)).to_degrees()
    }

    #[test]
    fn test_matrix_is_orthonormal() {
        let m = fk5_to_galactic_matrix().into_inner();
        let residual = (m * m.transpose() - Matrix3::identity()).abs().max();
        assert!(residual < 1e-14, "{}", residual);
        assert!((m.determinant() - 1.0).abs() < 1e-14);
    }

    #[test]
    fn test_matrix_matches_reference_values() {
        let m = fk5_to_galactic_matrix();
        #[rustfmt::skip]
        let reference = Matrix3::new(
            -0.054_875_539_395_714_5, -0.873_437_104_727_433_5, -0.483_834_991_770_322_5,
            0.494_109_453_623_363_8, -0.444_829_594_298_816_7, 0.746_982_248_702_05,
            -0.867_666_135_685_869_9, -0.198_076_389_610_949_9, 0.455_983_794_517_569_2,
        );
        assert!((m.matrix() - reference).abs().max() < 1e-12);
    }

    #[test]
    fn test_north_galactic_pole() {
        let g = equatorial_to_galactic(NGP_RA_J2000, NGP_DEC_J2000);
        assert!((g.b - 90.0).abs() < 1e-6);
    }

    #[test]
    fn test_galactic_centre() {
        let g = equatorial_to_galactic(266.404996, -28.936172);
        assert!(separation((g.l, g.b), (0.0, 0.0)) < 1e-5, "{:?}", g);

        let near = equatorial_to_galactic(266.417, -29.008);
        assert!(separation((near.l, near.b), (0.0, 0.0)) < 0.1, "{:?}", near);
        assert!((near.l - 359.944_161_6).abs() < 1e-6);
        assert!((near.b - -0.046_384_95).abs() < 1e-6);
    }

    #[test]
    fn test_orion_nebula() {
        let g = equatorial_to_galactic(83.822083, -5.391111);
        assert!((g.l - 209.013_737_7).abs() < 1e-6, "{:?}", g);
        assert!((g.b - -19.381_604_7).abs() < 1e-6, "{:?}", g);
    }

    #[test]
    fn test_longitude_range() {
        for ra in [0.0, 45.0, 90.0, 180.0, 266.4, 359.999] {
            for dec in [-89.0, -30.0, 0.0, 30.0, 89.0] {
                let g = equatorial_to_galactic(ra, dec);
                assert!((0.0..360.0).contains(&g.l), "l={} for ({}, {})", g.l, ra, dec);
                assert!((-90.0..=90.0).contains(&g.b));
            }
        }
    }
}
