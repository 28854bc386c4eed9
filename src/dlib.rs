//! Loader for dlib's `shape_predictor` serialization.
//!
//! Reads raw `.dat` files and bzip2-compressed `.dat.bz2` files, such as the
//! `shape_predictor_68_face_landmarks.dat` model published by dlib.
//!
//! # Wire format
//!
//! - Integers: one control byte (bit 7 = negative, low nibble = byte count)
//!   followed by that many little-endian magnitude bytes.
//! - Floats: an integer mantissa and an integer exponent, value = m·2^e.
//! - Sequences: an unsigned length followed by the elements.
//! - Matrices: negated row count, negated column count, then the elements.
//!
//! A shape predictor is stored as: version (1), initial shape column,
//! forests (one sequence of trees per cascade stage), anchor indices per
//! stage, pixel offsets per stage. A tree is its split sequence followed by
//! its leaf-delta columns.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use bzip2::read::BzDecoder;
use tracing::debug;

use crate::error::{Error, Result};
use crate::geometry::{Point, Shape};
use crate::predictor::{ShapePredictor, Stage};
use crate::tree::{RegressionTree, Split};

/// Where dlib publishes the 68-point model.
pub const MODEL_68_URL: &str = "http://dlib.net/files/shape_predictor_68_face_landmarks.dat.bz2";

/// Upper bound on speculative preallocation for length-prefixed data.
const MAX_PREALLOC: usize = 1 << 16;

struct DatReader<R: Read> {
    inner: R,
}

impl<R: Read> DatReader<R> {
    fn new(inner: R) -> Self {
        Self { inner }
    }

    fn int(&mut self) -> Result<i64> {
        let mut control = [0u8; 1];
        self.inner.read_exact(&mut control)?;
        let control = control[0];

        let len = usize::from(control & 0x0F);
        if len > 8 {
            return Err(Error::InvalidModel(format!(
                "integer encoded with {len} bytes"
            )));
        }

        let mut bytes = [0u8; 8];
        self.inner.read_exact(&mut bytes[..len])?;
        let magnitude = u64::from_le_bytes(bytes) as i64;

        Ok(if control & 0x80 != 0 {
            magnitude.wrapping_neg()
        } else {
            magnitude
        })
    }

    fn len(&mut self) -> Result<usize> {
        let value = self.int()?;
        usize::try_from(value)
            .map_err(|_| Error::InvalidModel(format!("negative length {value}")))
    }

    fn float(&mut self) -> Result<f32> {
        let mantissa = self.int()?;
        let exponent = self.int()?;
        if mantissa == 0 {
            return Ok(0.0);
        }
        let exponent = i32::try_from(exponent)
            .map_err(|_| Error::InvalidModel(format!("float exponent {exponent}")))?;
        Ok((mantissa as f64 * 2f64.powi(exponent)) as f32)
    }

    fn seq<T>(&mut self, mut item: impl FnMut(&mut Self) -> Result<T>) -> Result<Vec<T>> {
        let len = self.len()?;
        let mut out = Vec::with_capacity(len.min(MAX_PREALLOC));
        for _ in 0..len {
            out.push(item(self)?);
        }
        Ok(out)
    }

    /// A `rows x 1` float matrix.
    fn column(&mut self) -> Result<Vec<f32>> {
        let rows = -self.int()?;
        let cols = -self.int()?;
        if rows < 0 || cols != 1 {
            return Err(Error::InvalidModel(format!(
                "expected a column vector, got {rows}x{cols}"
            )));
        }
        let rows = rows as usize;
        let mut out = Vec::with_capacity(rows.min(MAX_PREALLOC));
        for _ in 0..rows {
            out.push(self.float()?);
        }
        Ok(out)
    }

    fn shape(&mut self, expected_landmarks: Option<usize>) -> Result<Shape> {
        let values = self.column()?;
        if values.len() % 2 != 0 {
            return Err(Error::InvalidModel(format!(
                "shape column has odd length {}",
                values.len()
            )));
        }
        if let Some(n) = expected_landmarks {
            if values.len() != 2 * n {
                return Err(Error::InvalidModel(format!(
                    "leaf delta has {} values, expected {}",
                    values.len(),
                    2 * n
                )));
            }
        }
        Ok(Shape::from_column(&values))
    }

    fn index(&mut self) -> Result<u32> {
        let value = self.int()?;
        u32::try_from(value).map_err(|_| Error::InvalidModel(format!("bad index {value}")))
    }

    fn tree(&mut self, num_landmarks: usize) -> Result<RegressionTree> {
        let splits = self.seq(|r| {
            Ok(Split {
                idx1: r.index()?,
                idx2: r.index()?,
                threshold: r.float()?,
            })
        })?;
        let leaves = self.seq(|r| r.shape(Some(num_landmarks)))?;
        RegressionTree::new(splits, leaves)
    }
}

/// Load a shape predictor from a `.dat` or `.dat.bz2` file.
pub fn load_dlib_model<P: AsRef<Path>>(path: P) -> Result<ShapePredictor> {
    let path = path.as_ref();
    let reader = BufReader::new(File::open(path)?);

    let model = if path.extension().is_some_and(|ext| ext == "bz2") {
        load_dlib_model_from_reader(BzDecoder::new(reader))?
    } else {
        load_dlib_model_from_reader(reader)?
    };

    debug!(
        path = %path.display(),
        landmarks = model.num_landmarks(),
        stages = model.num_cascade_stages(),
        "loaded shape predictor"
    );
    Ok(model)
}

/// Load a shape predictor from an uncompressed byte stream.
pub fn load_dlib_model_from_reader<R: Read>(reader: R) -> Result<ShapePredictor> {
    let mut r = DatReader::new(reader);

    let version = r.int()?;
    if version != 1 {
        return Err(Error::InvalidModel(format!(
            "unsupported shape_predictor version {version}"
        )));
    }

    let initial_shape = r.shape(None)?;
    let num_landmarks = initial_shape.num_landmarks();

    let forests = r.seq(|r| r.seq(|r| r.tree(num_landmarks)))?;
    let anchors = r.seq(|r| {
        r.seq(|r| {
            let idx = r.index()?;
            u16::try_from(idx).map_err(|_| Error::InvalidModel(format!("anchor {idx}")))
        })
    })?;
    let offsets = r.seq(|r| r.seq(|r| Ok(Point::new(r.float()?, r.float()?))))?;

    if anchors.len() != forests.len() || offsets.len() != forests.len() {
        return Err(Error::InvalidModel(format!(
            "{} stages but {} anchor sets and {} offset sets",
            forests.len(),
            anchors.len(),
            offsets.len()
        )));
    }

    let stages = forests
        .into_iter()
        .zip(anchors)
        .zip(offsets)
        .map(|((forest, anchors), offsets)| Stage {
            anchors,
            offsets,
            forest,
        })
        .collect();

    ShapePredictor::new(initial_shape, stages)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use std::path::PathBuf;

    /// Writes the same encoding [`DatReader`] parses.
    #[derive(Default)]
    struct DatWriter {
        bytes: Vec<u8>,
    }

    impl DatWriter {
        fn int(&mut self, value: i64) -> &mut Self {
            let magnitude = value.unsigned_abs();
            let len = (8 - magnitude.leading_zeros() as usize / 8).min(8);
            let sign = if value < 0 { 0x80 } else { 0x00 };
            self.bytes.push(sign | len as u8);
            self.bytes.extend_from_slice(&magnitude.to_le_bytes()[..len]);
            self
        }

        /// Exact for dyadic rationals such as 0.25 or -1.5.
        fn float(&mut self, value: f32) -> &mut Self {
            let mut mantissa = f64::from(value);
            let mut exponent = 0i64;
            while mantissa.fract() != 0.0 && exponent > -60 {
                mantissa *= 2.0;
                exponent -= 1;
            }
            self.int(mantissa as i64).int(exponent)
        }

        fn column(&mut self, values: &[f32]) -> &mut Self {
            self.int(-(values.len() as i64)).int(-1);
            for &v in values {
                self.float(v);
            }
            self
        }
    }

    /// A two-landmark model with one stage holding one depth-1 tree.
    fn tiny_model_bytes() -> Vec<u8> {
        let mut w = DatWriter::default();
        w.int(1).column(&[0.25, 0.5, 0.75, 0.5]);
        // forests: 1 stage, 1 tree, 1 split, 2 leaves
        w.int(1).int(1);
        w.int(1).int(0).int(1).float(0.0);
        w.int(2)
            .column(&[-0.125, 0.0, -0.125, 0.0])
            .column(&[0.125, 0.0, 0.125, 0.0]);
        // anchors
        w.int(1).int(2).int(0).int(1);
        // offsets
        w.int(1).int(2).float(0.0).float(0.0).float(0.0).float(0.0);
        w.bytes
    }

    #[test]
    fn integer_codec() {
        let mut w = DatWriter::default();
        for v in [0, 1, 127, 128, 255, 256, -1, -128, 70_000, -5_000_000_000] {
            w.int(v);
        }
        let mut r = DatReader::new(Cursor::new(w.bytes));
        for v in [0, 1, 127, 128, 255, 256, -1, -128, 70_000, -5_000_000_000] {
            assert_eq!(r.int().unwrap(), v);
        }
    }

    #[test]
    fn float_codec() {
        let mut w = DatWriter::default();
        for v in [0.0, 1.0, -1.0, 0.5, 0.25, -0.125, 3.75] {
            w.float(v);
        }
        let mut r = DatReader::new(Cursor::new(w.bytes));
        for v in [0.0, 1.0, -1.0, 0.5, 0.25, -0.125, 3.75] {
            assert!((r.float().unwrap() - v).abs() < 1e-7);
        }
    }

    #[test]
    fn oversized_integer_is_rejected() {
        let mut r = DatReader::new(Cursor::new(vec![0x09u8; 16]));
        assert!(matches!(r.int(), Err(Error::InvalidModel(_))));
    }

    #[test]
    fn tiny_model_loads() {
        let model = load_dlib_model_from_reader(Cursor::new(tiny_model_bytes())).unwrap();
        assert_eq!(model.num_landmarks(), 2);
        assert_eq!(model.num_cascade_stages(), 1);
    }

    #[test]
    fn wrong_version_is_rejected() {
        let mut bytes = tiny_model_bytes();
        bytes[1] = 2;
        assert!(matches!(
            load_dlib_model_from_reader(Cursor::new(bytes)),
            Err(Error::InvalidModel(_))
        ));
    }

    #[test]
    fn truncated_file_is_an_error() {
        let bytes = tiny_model_bytes();
        let cut = &bytes[..bytes.len() / 2];
        assert!(load_dlib_model_from_reader(Cursor::new(cut.to_vec())).is_err());
    }

    #[test]
    fn wrong_leaf_count_is_rejected() {
        let mut w = DatWriter::default();
        w.int(1).column(&[0.5, 0.5]);
        w.int(1).int(1);
        w.int(1).int(0).int(0).float(0.0);
        w.int(1).column(&[0.0, 0.0]);
        w.int(1).int(1).int(0);
        w.int(1).int(1).float(0.0).float(0.0);
        assert!(matches!(
            load_dlib_model_from_reader(Cursor::new(w.bytes)),
            Err(Error::InvalidModel(_))
        ));
    }

    #[test]
    fn missing_file_is_io_error() {
        let path = std::env::temp_dir().join("browmark-no-such-model.dat");
        assert!(matches!(load_dlib_model(path), Err(Error::Io(_))));
    }

    fn dlib_models_dir() -> Option<PathBuf> {
        let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("dlib-models");
        path.exists().then_some(path)
    }

    /// Requires a checkout of dlib-models next to Cargo.toml:
    /// ```bash
    /// git clone --depth 1 https://github.com/davisking/dlib-models.git
    /// ```
    #[test]
    fn load_68_point_model() {
        let Some(models_dir) = dlib_models_dir() else {
            eprintln!("Skipping test: dlib-models directory not found");
            return;
        };
        let model_path = models_dir.join("shape_predictor_68_face_landmarks.dat.bz2");
        if !model_path.exists() {
            eprintln!("Skipping test: model file not found at {:?}", model_path);
            return;
        }

        let model = load_dlib_model(&model_path).expect("Failed to load 68-point model");
        assert_eq!(model.num_landmarks(), 68);
        assert!(model.num_cascade_stages() > 0);
    }
}
