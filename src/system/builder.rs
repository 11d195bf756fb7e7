use super::CurveletSystem;
use crate::error::{CurveletError, Result};
use crate::fourier::fft2c;
use crate::settings::DctSettings;
use crate::wrapping::{CurveletEngine, WedgeCoefficients};
use ndarray::Array2;
use rayon::prelude::*;
use rustfft::num_complex::Complex64;
use tracing::{debug, info, info_span};

/// A unit impulse written into the center of one wedge of a coefficient
/// template. Dropping the guard clears it again, whichever way the probe
/// ends.
struct ProbeGuard<'a> {
    template: &'a mut WedgeCoefficients,
    scale: usize,
    wedge: usize,
    at: (usize, usize),
}

impl<'a> ProbeGuard<'a> {
    fn place(template: &'a mut WedgeCoefficients, scale: usize, wedge: usize) -> Result<Self> {
        let cell = template
            .get_mut(scale)
            .and_then(|level| level.get_mut(wedge))
            .ok_or_else(|| {
                CurveletError::construction(format!("template has no wedge ({scale}, {wedge})"))
            })?;
        let (height, width) = cell.dim();
        if height == 0 || width == 0 {
            return Err(CurveletError::construction(format!(
                "wedge ({scale}, {wedge}) has an empty footprint"
            )));
        }
        let at = (height / 2, width / 2);
        cell[at] = Complex64::new(1.0, 0.0);
        Ok(Self {
            template,
            scale,
            wedge,
            at,
        })
    }

    fn coefficients(&self) -> &WedgeCoefficients {
        &*self.template
    }

    fn footprint(&self) -> (usize, usize) {
        self.template[self.scale][self.wedge].dim()
    }
}

impl Drop for ProbeGuard<'_> {
    fn drop(&mut self) {
        self.template[self.scale][self.wedge][self.at] = Complex64::new(0.0, 0.0);
    }
}

/// Engine failures surface as construction errors whatever their origin.
fn engine_failure(err: CurveletError) -> CurveletError {
    match err {
        CurveletError::Construction(_) => err,
        other => CurveletError::construction(other.to_string()),
    }
}

/// Runs the engine forward on a zero image to obtain the coefficient layout.
fn zero_template<E: CurveletEngine + ?Sized>(
    engine: &E,
    rows: usize,
    cols: usize,
    settings: &DctSettings,
) -> Result<WedgeCoefficients> {
    let zeros = Array2::<Complex64>::zeros((rows, cols));
    let template = engine
        .fdct_wrapping(&zeros.view(), settings)
        .map_err(engine_failure)?;

    let expected = settings.wedges_per_scale();
    let actual: Vec<usize> = template.iter().map(Vec::len).collect();
    if expected != actual {
        return Err(CurveletError::construction(format!(
            "engine returned wedge layout {actual:?}, settings imply {expected:?}"
        )));
    }
    Ok(template)
}

fn probe<E: CurveletEngine + ?Sized>(
    engine: &E,
    template: &mut WedgeCoefficients,
    (scale, wedge): (usize, usize),
    rows: usize,
    cols: usize,
    is_real: bool,
) -> Result<Array2<Complex64>> {
    let guard = ProbeGuard::place(template, scale, wedge)?;
    let (height, width) = guard.footprint();
    let response = engine
        .ifdct_wrapping(guard.coefficients(), is_real, rows, cols)
        .map_err(engine_failure)?;
    drop(guard);

    if response.dim() != (rows, cols) {
        return Err(CurveletError::construction(format!(
            "impulse response of wedge ({scale}, {wedge}) has shape {:?}, expected {:?}",
            response.dim(),
            (rows, cols)
        )));
    }
    debug!(scale, wedge, height, width, "probed wedge");
    Ok(fft2c(&response.view()))
}

fn layout(template: &WedgeCoefficients) -> (Vec<(usize, usize)>, Vec<(usize, usize)>) {
    template
        .iter()
        .enumerate()
        .flat_map(|(scale, level)| {
            level
                .iter()
                .enumerate()
                .map(move |(wedge, c)| ((scale, wedge), c.dim()))
        })
        .unzip()
}

/// Builds the curvelet system for `rows x cols` images by probing `engine`
/// with one unit impulse per wedge, in scale-major, wedge-minor order.
pub fn build_curvelet_system<E: CurveletEngine + ?Sized>(
    engine: &E,
    rows: usize,
    cols: usize,
    settings: &DctSettings,
) -> Result<CurveletSystem> {
    let span = info_span!(
        "build_curvelet_system",
        rows,
        cols,
        nbscales = settings.nbscales,
        is_real = settings.is_real
    );
    let _enter = span.enter();

    let mut template = zero_template(engine, rows, cols, settings)?;
    let (labels, footprints) = layout(&template);
    let mut waveforms = Vec::with_capacity(labels.len());
    for &label in &labels {
        waveforms.push(probe(engine, &mut template, label, rows, cols, settings.is_real)?);
    }

    let system = CurveletSystem::from_probes(rows, cols, *settings, labels, footprints, waveforms)?;
    info!(wedges = system.len(), "curvelet system built");
    Ok(system)
}

/// Same system as [`build_curvelet_system`], with wedges probed on rayon
/// workers. Each worker probes its own copy of the zero template.
pub fn build_curvelet_system_par<E: CurveletEngine + Sync + ?Sized>(
    engine: &E,
    rows: usize,
    cols: usize,
    settings: &DctSettings,
) -> Result<CurveletSystem> {
    let span = info_span!(
        "build_curvelet_system_par",
        rows,
        cols,
        nbscales = settings.nbscales,
        is_real = settings.is_real
    );
    let _enter = span.enter();

    let template = zero_template(engine, rows, cols, settings)?;
    let (labels, footprints) = layout(&template);
    let waveforms = labels
        .par_iter()
        .map_init(
            || template.clone(),
            |scratch, &label| probe(engine, scratch, label, rows, cols, settings.is_real),
        )
        .collect::<Result<Vec<_>>>()?;

    let system = CurveletSystem::from_probes(rows, cols, *settings, labels, footprints, waveforms)?;
    info!(wedges = system.len(), "curvelet system built");
    Ok(system)
}
