use std::collections::HashMap;
use std::path::Path;

use nalgebra::DMatrix;

use crate::coordinate::CelestialCoord;
use crate::error::{WcsError, WcsResult};
use crate::header::{HeaderParser, KeywordProvider};
use crate::linear::LinearTransform;
use crate::spherical::{Projection, SphericalRotation};

/// Spectral algorithm codes that are not linear in pixel coordinates.
const NON_LINEAR_ALGORITHMS: [&str; 16] = [
    "F2W", "F2V", "F2A", "W2F", "W2V", "W2A", "V2F", "V2W", "V2A", "A2F", "A2W", "A2V", "LOG",
    "GRI", "GRA", "TAB",
];

#[derive(Debug, Clone, PartialEq)]
pub struct CubeAxis {
    ctype: String,
    type_name: String,
    code: Option<String>,
    extent: usize,
}

impl CubeAxis {
    /// Splits a CTYPE value such as `RA---SIN` or `VOPT-F2W` into its
    /// coordinate type and algorithm code. `CNAME` replaces the type name
    /// when given.
    pub fn new(ctype: &str, cname: Option<&str>, extent: usize) -> Self {
        let ctype = ctype.trim();
        let (prefix, code) = match ctype.split_once('-') {
            Some((prefix, rest)) => {
                let code = rest.trim_start_matches('-').trim();
                (prefix, (!code.is_empty()).then(|| code.to_string()))
            }
            None => (ctype, None),
        };
        let type_name = match cname.map(str::trim) {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => prefix.to_string(),
        };
        Self {
            ctype: ctype.to_string(),
            type_name,
            code,
            extent,
        }
    }

    pub fn ctype(&self) -> &str {
        &self.ctype
    }

    /// Physical type label: `RA`, `DEC`, `GLON`, `FREQ`, `VRAD`, `STOKES`, ...
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn code(&self) -> Option<&str> {
        self.code.as_deref()
    }

    /// Number of pixels along the axis (`NAXISn`).
    pub fn extent(&self) -> usize {
        self.extent
    }

    fn coordinate_prefix(&self) -> &str {
        self.ctype.split('-').next().unwrap_or("")
    }

    fn is_longitude(&self) -> bool {
        let prefix = self.coordinate_prefix();
        prefix == "RA" || (prefix.len() == 4 && prefix.ends_with("LON"))
    }

    fn is_latitude(&self) -> bool {
        let prefix = self.coordinate_prefix();
        prefix == "DEC" || (prefix.len() == 4 && prefix.ends_with("LAT"))
    }
}

#[derive(Debug, Clone)]
struct CelestialPair {
    lon: usize,
    lat: usize,
    projection: Projection,
    rotation: SphericalRotation,
}

/// World coordinate system of an N-dimensional data cube.
///
/// The celestial longitude/latitude pair, when present, is handled through
/// a spherical projection; every other axis is linear. Pixel coordinates
/// exchanged through the public API are 0-based.
#[derive(Debug, Clone)]
pub struct CubeWcs {
    axes: Vec<CubeAxis>,
    crval: Vec<f64>,
    linear: LinearTransform,
    celestial: Option<CelestialPair>,
}

impl CubeWcs {
    pub fn open(path: impl AsRef<Path>) -> WcsResult<Self> {
        let header = HeaderParser::read_primary_header(path)?;
        Self::from_header(&header)
    }

    pub fn from_header(header: &impl KeywordProvider) -> WcsResult<Self> {
        let naxis = header.require_int("NAXIS")?;
        let wcsaxes = header.get_int("WCSAXES").unwrap_or(naxis);
        let n = naxis.max(wcsaxes);
        if n <= 0 {
            return Err(WcsError::invalid_keyword("NAXIS", "cube has no axes"));
        }
        let n = n as usize;

        let axes = read_axes(header, naxis as usize, n)?;
        let crpix = indexed_floats(header, "CRPIX", n, 0.0);
        let crval = indexed_floats(header, "CRVAL", n, 0.0);
        let cdelt = indexed_floats(header, "CDELT", n, 1.0);

        let celestial_axes = find_celestial_axes(&axes)?;
        check_linear_axes(&axes, celestial_axes)?;

        let linear = match read_matrix(header, "CD", n) {
            Some(cd) => LinearTransform::from_cd(&crpix, cd)?,
            None => {
                let pc = read_matrix(header, "PC", n)
                    .unwrap_or_else(|| crota_matrix(header, celestial_axes, &cdelt, n));
                LinearTransform::from_pc_cdelt(&crpix, pc, &cdelt)?
            }
        };

        let celestial = match celestial_axes {
            Some((lon, lat)) => Some(build_celestial(header, &axes, &crval, lon, lat)?),
            None => None,
        };

        Ok(Self {
            axes,
            crval,
            linear,
            celestial,
        })
    }

    pub fn naxis(&self) -> usize {
        self.axes.len()
    }

    pub fn axes(&self) -> &[CubeAxis] {
        &self.axes
    }

    pub fn axis_type_names(&self) -> Vec<&str> {
        self.axes.iter().map(CubeAxis::type_name).collect()
    }

    pub fn extents(&self) -> Vec<usize> {
        self.axes.iter().map(CubeAxis::extent).collect()
    }

    pub fn projection_code(&self) -> Option<&'static str> {
        self.celestial.as_ref().map(|c| c.projection.code())
    }

    /// World coordinates (native axis order, header units) to 0-based pixels.
    pub fn world_to_pixel(&self, world: &[f64]) -> WcsResult<Vec<f64>> {
        self.check_len(world.len())?;

        let mut intermediate: Vec<f64> = world
            .iter()
            .zip(&self.crval)
            .map(|(w, crval)| w - crval)
            .collect();

        if let Some(pair) = &self.celestial {
            let celestial = CelestialCoord::new(world[pair.lon], world[pair.lat]);
            let native = pair.rotation.celestial_to_native(celestial);
            let projected = pair.projection.project(native)?;
            intermediate[pair.lon] = projected.x_deg();
            intermediate[pair.lat] = projected.y_deg();
        }

        let pixel = self.linear.intermediate_to_pixel(&intermediate);
        Ok(pixel.into_iter().map(|p| p - 1.0).collect())
    }

    fn check_len(&self, len: usize) -> WcsResult<()> {
        if len != self.naxis() {
            return Err(WcsError::invalid_parameter(format!(
                "expected {} coordinates, got {}",
                self.naxis(),
                len
            )));
        }
        Ok(())
    }
}

fn read_axes(header: &impl KeywordProvider, naxis: usize, n: usize) -> WcsResult<Vec<CubeAxis>> {
    (1..=n)
        .map(|i| -> WcsResult<CubeAxis> {
            let extent = if i <= naxis {
                let value = header.require_int(&format!("NAXIS{}", i))?;
                usize::try_from(value).map_err(|_| {
                    WcsError::invalid_keyword(format!("NAXIS{}", i), "negative axis length")
                })?
            } else {
                1
            };
            let ctype = header.get_string(&format!("CTYPE{}", i)).unwrap_or_default();
            let cname = header.get_string(&format!("CNAME{}", i));
            Ok(CubeAxis::new(&ctype, cname.as_deref(), extent))
        })
        .collect()
}

fn indexed_floats(header: &impl KeywordProvider, prefix: &str, n: usize, default: f64) -> Vec<f64> {
    (1..=n)
        .map(|i| header.get_float(&format!("{}{}", prefix, i)).unwrap_or(default))
        .collect()
}

/// Reads `{prefix}i_j`. Returns `None` when no element is present; missing
/// elements default to the identity for PC and to zero for CD.
fn read_matrix(header: &impl KeywordProvider, prefix: &str, n: usize) -> Option<DMatrix<f64>> {
    let mut found = false;
    let matrix = DMatrix::from_fn(n, n, |row, col| {
        match header.get_float(&format!("{}{}_{}", prefix, row + 1, col + 1)) {
            Some(value) => {
                found = true;
                value
            }
            None if prefix == "PC" && row == col => 1.0,
            None => 0.0,
        }
    });
    found.then_some(matrix)
}

/// Legacy `CROTAn` rotation on the latitude axis, expressed as a PC matrix.
fn crota_matrix(
    header: &impl KeywordProvider,
    celestial: Option<(usize, usize)>,
    cdelt: &[f64],
    n: usize,
) -> DMatrix<f64> {
    let mut pc = DMatrix::identity(n, n);
    let Some((lon, lat)) = celestial else {
        return pc;
    };
    let Some(crota) = header.get_float(&format!("CROTA{}", lat + 1)) else {
        return pc;
    };
    if cdelt[lon] == 0.0 || cdelt[lat] == 0.0 {
        return pc;
    }

    let (s, c) = crota.to_radians().sin_cos();
    let ratio = cdelt[lat] / cdelt[lon];
    pc[(lon, lon)] = c;
    pc[(lon, lat)] = -s * ratio;
    pc[(lat, lon)] = s / ratio;
    pc[(lat, lat)] = c;
    pc
}

fn find_celestial_axes(axes: &[CubeAxis]) -> WcsResult<Option<(usize, usize)>> {
    let projected = |axis: &&CubeAxis| axis.code().is_some();
    let lon: Vec<usize> = axes
        .iter()
        .enumerate()
        .filter(|(_, a)| a.is_longitude() && projected(a))
        .map(|(i, _)| i)
        .collect();
    let lat: Vec<usize> = axes
        .iter()
        .enumerate()
        .filter(|(_, a)| a.is_latitude() && projected(a))
        .map(|(i, _)| i)
        .collect();

    match (lon.as_slice(), lat.as_slice()) {
        ([], []) => Ok(None),
        ([lon], [lat]) => {
            let (lon_code, lat_code) = (axes[*lon].code(), axes[*lat].code());
            if lon_code != lat_code {
                return Err(WcsError::invalid_keyword(
                    format!("CTYPE{}/CTYPE{}", lon + 1, lat + 1),
                    format!(
                        "Mismatched projection codes: '{}' vs '{}'",
                        lon_code.unwrap_or(""),
                        lat_code.unwrap_or("")
                    ),
                ));
            }
            Ok(Some((*lon, *lat)))
        }
        _ => Err(WcsError::invalid_keyword(
            "CTYPE",
            format!(
                "expected one celestial longitude and one latitude axis, found {} and {}",
                lon.len(),
                lat.len()
            ),
        )),
    }
}

fn check_linear_axes(axes: &[CubeAxis], celestial: Option<(usize, usize)>) -> WcsResult<()> {
    for (i, axis) in axes.iter().enumerate() {
        if matches!(celestial, Some((lon, lat)) if i == lon || i == lat) {
            continue;
        }
        if let Some(code) = axis.code() {
            if NON_LINEAR_ALGORITHMS.contains(&code) {
                return Err(WcsError::unsupported_algorithm(i + 1, code));
            }
        }
    }
    Ok(())
}

fn build_celestial(
    header: &impl KeywordProvider,
    axes: &[CubeAxis],
    crval: &[f64],
    lon: usize,
    lat: usize,
) -> WcsResult<CelestialPair> {
    let code = axes[lon].code().unwrap_or_default();
    let pv: HashMap<u8, f64> = (0u8..=3)
        .filter_map(|m| {
            header
                .get_float(&format!("PV{}_{}", lat + 1, m))
                .map(|value| (m, value))
        })
        .collect();

    let projection = Projection::from_code(code, &pv)?;
    let (_, theta_0) = projection.native_reference();
    let rotation = SphericalRotation::from_crval(
        crval[lon],
        crval[lat],
        theta_0,
        header.get_float("LONPOLE"),
        header.get_float("LATPOLE"),
    )?;

    Ok(CelestialPair {
        lon,
        lat,
        projection,
        rotation,
    })
}
