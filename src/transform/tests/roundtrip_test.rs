use super::{max_abs_diff, random_image, small_system, system};
use crate::backend::NdarrayBackend;
use crate::error::CurveletError;
use crate::settings::{DctSettings, Finest};
use crate::transform::{fdct_2d, ifdct_2d, reconstruct, CurveletTransform};
use ndarray::{Array2, Array3};
use rustfft::num_complex::Complex64;

#[test]
fn test_zero_image_scenario() {
    let system = system(64, 64, DctSettings::new(false, Finest::Wavelets, 3, 8));
    assert_eq!(system.len(), 10);

    let zeros = Array2::<Complex64>::zeros((64, 64));
    let coeffs = fdct_2d(&zeros, &system).unwrap();
    assert_eq!(coeffs.dim(), (10, 64, 64));
    assert!(coeffs.iter().all(|v| v.norm() == 0.0));

    let decomposition = ifdct_2d(&coeffs.view(), &system).unwrap();
    let image = reconstruct(&decomposition.view());
    assert!(image.iter().all(|v| v.norm() < 1e-12));
}

#[test]
fn test_round_trip_reconstructs_image() {
    let cases = [
        (64, 64, DctSettings::new(false, Finest::Wavelets, 3, 8)),
        (48, 40, DctSettings::new(false, Finest::Curvelets, 3, 16)),
        (33, 31, DctSettings::new(true, Finest::Wavelets, 3, 8)),
        (64, 64, DctSettings::new(true, Finest::Curvelets, 3, 8)),
        (32, 32, DctSettings::new(true, Finest::Curvelets, 2, 8)),
    ];
    for (rows, cols, settings) in cases {
        let system = system(rows, cols, settings);
        let image = random_image(rows, cols, 11);
        let coeffs = fdct_2d(&image, &system).unwrap();
        let back = reconstruct(&ifdct_2d(&coeffs.view(), &system).unwrap().view());
        let err = max_abs_diff(&image.view(), &back.view());
        assert!(err < 1e-6, "{rows}x{cols} {settings:?}: error {err}");
    }
}

#[test]
fn test_transform_reconstruct_matches_free_function() {
    let system = small_system();
    let transform = CurveletTransform::new(NdarrayBackend, &system);
    let image = random_image(24, 20, 3);
    let decomposition = transform.inverse(&transform.forward(&image).unwrap()).unwrap();
    let summed = transform.reconstruct(&decomposition).unwrap();
    assert!(max_abs_diff(&image.view(), &summed.view()) < 1e-9);
    assert!(matches!(
        transform.reconstruct(&[]),
        Err(CurveletError::WedgeCountMismatch { actual: 0, .. })
    ));
}

#[test]
fn test_parallel_matches_sequential() {
    let system = small_system();
    let transform = CurveletTransform::new(NdarrayBackend, &system);
    let image = random_image(24, 20, 3);
    let seq = transform.forward(&image).unwrap();
    let par = transform.forward_par(&image).unwrap();
    for (a, b) in seq.iter().zip(&par) {
        assert_eq!(a, b);
    }
    let seq = transform.inverse(&seq).unwrap();
    let par = transform.inverse_par(&par).unwrap();
    for (a, b) in seq.iter().zip(&par) {
        assert_eq!(a, b);
    }
}

#[test]
fn test_shape_errors() {
    let system = small_system();
    let n = system.len();

    let wrong_image = Array2::<Complex64>::zeros((20, 24));
    assert!(matches!(
        fdct_2d(&wrong_image, &system),
        Err(CurveletError::ShapeMismatch { expected: (24, 20), actual: (20, 24), .. })
    ));

    let too_few = Array3::<Complex64>::zeros((n - 1, 24, 20));
    assert!(matches!(
        ifdct_2d(&too_few.view(), &system),
        Err(CurveletError::WedgeCountMismatch { expected, actual }) if expected == n && actual == n - 1
    ));

    let transform = CurveletTransform::new(NdarrayBackend, &system);
    let mut coeffs = vec![Array2::<Complex64>::zeros((24, 20)); n];
    coeffs[3] = Array2::zeros((24, 21));
    assert!(matches!(
        transform.inverse(&coeffs),
        Err(CurveletError::ShapeMismatch { .. })
    ));
}
