use super::{max_abs_diff, random_image, small_system};
use crate::backend::{BackendKind, NdarrayBackend};
use crate::transform::{CurveletTransform, DynTransform};
use rustfft::num_complex::Complex64;

#[test]
fn test_runtime_dispatch_reports_kind() {
    let system = small_system();
    for kind in BackendKind::ALL {
        match DynTransform::new(kind, &system) {
            Ok(transform) => assert_eq!(transform.kind(), kind),
            Err(err) => assert!(!kind.is_available(), "{kind}: {err}"),
        }
    }
}

#[test]
fn test_backends_agree() {
    let system = small_system();
    let image = random_image(24, 20, 1);
    let reference = CurveletTransform::new(NdarrayBackend, &system);
    let expected_coeffs = reference.forward(&image).unwrap();
    let expected_decomp = reference.inverse(&expected_coeffs).unwrap();

    for kind in BackendKind::ALL.into_iter().filter(|k| k.is_available()) {
        let transform = DynTransform::new(kind, &system).unwrap();
        let coeffs = transform.forward(&image).unwrap();
        let decomp = transform.inverse(&coeffs).unwrap();
        for (a, b) in coeffs.iter().zip(&expected_coeffs) {
            assert!(max_abs_diff(&a.view(), &b.view()) < 1e-10, "{kind} forward");
        }
        for (a, b) in decomp.iter().zip(&expected_decomp) {
            assert!(max_abs_diff(&a.view(), &b.view()) < 1e-10, "{kind} inverse");
        }
    }
}

#[cfg(feature = "dual")]
#[test]
fn test_dual_tangent_matches_finite_differences() {
    use crate::backend::{DualArray, DualBackend};

    let system = small_system();
    let x = random_image(24, 20, 2);
    let v = random_image(24, 20, 3).mapv(|z| z * Complex64::new(0.0, 1.0));
    let dual = CurveletTransform::new(DualBackend, &system);
    let plain = CurveletTransform::new(NdarrayBackend, &system);

    let seeded = DualArray::new(x.clone(), v.clone()).unwrap();
    let coeffs = dual.forward(&seeded).unwrap();
    let decomp = dual.inverse(&coeffs).unwrap();

    let eps = 1e-4;
    let step = v.mapv(|z| z * eps);
    let plus = plain.forward(&(&x + &step)).unwrap();
    let minus = plain.forward(&(&x - &step)).unwrap();
    for (j, c) in coeffs.iter().enumerate() {
        assert!(max_abs_diff(&c.primal.view(), &plain.forward(&x).unwrap()[j].view()) < 1e-10);
        let numeric = (&plus[j] - &minus[j]).mapv(|z| z / (2.0 * eps));
        assert!(max_abs_diff(&c.tangent.view(), &numeric.view()) < 1e-7, "wedge {j}");
    }

    // The inverse is linear too, so the summed tangent is the direction.
    let summed = dual.reconstruct(&decomp).unwrap();
    assert!(max_abs_diff(&summed.tangent.view(), &v.view()) < 1e-9);
}

#[cfg(feature = "tape")]
#[test]
fn test_tape_gradient_matches_finite_differences() {
    use crate::backend::{Backend, GradTensor, TapeBackend};

    let system = small_system();
    let x0 = random_image(24, 20, 4);
    let w = random_image(24, 20, 5);
    let tape = CurveletTransform::new(TapeBackend, &system);
    let plain = CurveletTransform::new(NdarrayBackend, &system);

    // L(x) = sum_j ||coeffs_j * w||^2 + ||reconstruction||^2
    let loss_value = |x: &ndarray::Array2<Complex64>| -> f64 {
        let coeffs = plain.forward(x).unwrap();
        let weighted: f64 = coeffs
            .iter()
            .map(|c| (c * &w).iter().map(|z| z.norm_sqr()).sum::<f64>())
            .sum();
        let back = plain.reconstruct(&plain.inverse(&coeffs).unwrap()).unwrap();
        weighted + back.iter().map(|z| z.norm_sqr()).sum::<f64>()
    };

    let x = GradTensor::variable(x0.clone());
    let backend = TapeBackend;
    let coeffs = tape.forward(&x).unwrap();
    let lifted_w = backend.lift(&w.view());
    let weighted = coeffs
        .iter()
        .map(|c| backend.mul(c, &lifted_w).squared_norm())
        .reduce(|a, b| backend.add(&a, &b))
        .unwrap();
    let back = tape.reconstruct(&tape.inverse(&coeffs).unwrap()).unwrap();
    let loss = backend.add(&weighted, &back.squared_norm());
    assert!((loss.item().re - loss_value(&x0)).abs() < 1e-8 * loss_value(&x0));

    loss.backward().unwrap();
    let grad = x.grad().unwrap();
    let eps = 1e-6;
    for &(i, j) in &[(0, 0), (5, 7), (12, 10), (23, 19)] {
        for (part, direction) in [(0, Complex64::new(1.0, 0.0)), (1, Complex64::new(0.0, 1.0))] {
            let mut plus = x0.clone();
            plus[[i, j]] += direction * eps;
            let mut minus = x0.clone();
            minus[[i, j]] -= direction * eps;
            let numeric = (loss_value(&plus) - loss_value(&minus)) / (2.0 * eps);
            let analytic = if part == 0 { grad[[i, j]].re } else { grad[[i, j]].im };
            assert!(
                (analytic - numeric).abs() < 1e-4 * (1.0 + numeric.abs()),
                "({i}, {j}) part {part}: {analytic} vs {numeric}"
            );
        }
    }
}
