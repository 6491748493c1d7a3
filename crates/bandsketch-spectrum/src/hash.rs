use sha2::{Digest, Sha256};

use crate::view::Spectrum;

fn update_f64(hasher: &mut Sha256, value: f64) {
    hasher.update(value.to_bits().to_le_bytes());
}

/// Computes the canonical hash of a spectrum: shape, samples, orderings and
/// interpolation coefficients, hex encoded.
pub fn canonical_spectrum_hash(spectrum: &Spectrum) -> String {
    let mut hasher = Sha256::new();
    let nbands = spectrum.nbands();
    let samples = spectrum.x().len();
    hasher.update((nbands as u64).to_le_bytes());
    hasher.update((samples as u64).to_le_bytes());

    for (row, &x) in spectrum.x().iter().enumerate() {
        update_f64(&mut hasher, x);
        for band in 0..nbands {
            update_f64(&mut hasher, spectrum.y()[(row, band)]);
            update_f64(&mut hasher, spectrum.dy()[(row, band)]);
            hasher.update((spectrum.ordering()[(row, band)] as u64).to_le_bytes());
        }
    }

    let spline = spectrum.interpolant();
    for interval in 0..spline.intervals() {
        for band in 0..nbands {
            for coeff in spline.coefficients(interval, band).into_iter().flatten() {
                update_f64(&mut hasher, coeff);
            }
        }
    }

    hex::encode(hasher.finalize())
}
