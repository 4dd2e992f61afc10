use std::{
    fs::File,
    io::{BufReader, BufWriter, Read, Write},
    path::Path,
};

use anyhow::{anyhow, bail, Context, Result};
use memmap2::MmapOptions;

use crate::interpolation::InterpolationScheme;
use crate::nuclear_data::{FissionSpectrum, IsotopeData, NuData, ReactionData, ThermalData};

//=====================================================================
// Binary isotope library format. Libraries are memory mapped on load.
//=====================================================================

// The format as follows (from start of file to end):
//    - Header section (64 bytes)
//        - Magic bytes "KXSLIB01"
//        - Isotope name written as ASCII bytes and padded to 32 bytes with whitespace
//        - Atomic weight ratio as an f64
//        - Evaluation temperature as an f64
//        - Interpolation scheme number as an f64
//    - Data section, every value written as the raw bytes of an f64. Counts, MT
//      numbers and indices are stored as f64 too and converted back on read.
//      Each array is written as its length followed by its values.
//        - Energy grid
//        - Total flag (0 or 1) followed by the total cross section if 1
//        - Reaction count, then per reaction: MT, Q value, threshold index, values
//        - Nu-bar tag (0 none, 1 polynomial, 2 tabulated) and its arrays
//        - Fission spectrum tag (0 none, 1 Watt a b, 2 Maxwell theta)
//        - Thermal table count, then per table: temperature, cutoff, energy,
//          elastic and inelastic arrays

const MAGIC: &[u8; 8] = b"KXSLIB01";
const NAME_LENGTH: usize = 32;
const HEADER_LENGTH: usize = 64;

// Checks if a file is ASCII by reading the first 1 kB of the file
pub fn is_ascii_file<P: AsRef<Path>>(path: P) -> Result<bool> {
    let file = File::open(path.as_ref()).with_context(|| format!("Failed to open {}", path.as_ref().display()))?;
    let mut reader = BufReader::new(file);
    let mut buffer = vec![0; 1024];

    match reader.read(&mut buffer)? {
        0 => Ok(true),
        n => Ok(!buffer[..n].iter().any(|&byte| byte >= 128 || (byte < 32 && !matches!(byte, 9 | 10 | 13)))),
    }
}

//=====================================================================
// Memory-mapped isotope library file.
//=====================================================================
pub struct XsMmap(memmap2::Mmap);

impl XsMmap {
    // Take a pre-existing library file and map it into memory.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path.as_ref())
            .with_context(|| format!("Failed to open isotope library: {:?}", path.as_ref()))?;

        let mmap = unsafe { MmapOptions::new().map(&file) }
            .with_context(|| format!("Failed to memory map isotope library: {:?}", path.as_ref()))?;
        if mmap.len() < HEADER_LENGTH || &mmap[0..8] != MAGIC {
            bail!("{:?} is not an isotope library (bad header)", path.as_ref());
        }
        if (mmap.len() - HEADER_LENGTH) % 8 != 0 {
            bail!("{:?} is truncated: data section is not a whole number of values", path.as_ref());
        }
        Ok(Self(mmap))
    }

    // Pull the bytes corresponding to the header
    pub fn header_bytes(&self) -> &[u8] {
        &self.0[0..HEADER_LENGTH]
    }

    // Pull the bytes of the data section
    pub fn data_bytes(&self) -> &[u8] {
        &self.0[HEADER_LENGTH..]
    }

    pub fn to_isotope_data(&self) -> Result<IsotopeData> {
        let header = self.header_bytes();
        let name = std::str::from_utf8(&header[8..8 + NAME_LENGTH])
            .context("Isotope name is not valid ASCII")?
            .trim_end()
            .to_string();
        let header_f64 = |offset: usize| {
            let mut bytes = [0u8; 8];
            bytes.copy_from_slice(&header[offset..offset + 8]);
            f64::from_ne_bytes(bytes)
        };
        let awr = header_f64(40);
        let temperature = header_f64(48);
        let interpolation = scheme_from_f64(header_f64(56))?;

        let mut cursor = WordCursor { bytes: self.data_bytes(), position: 0 };
        let energy = cursor.array()?;
        let total = match cursor.count()? {
            0 => None,
            1 => Some(cursor.array()?),
            flag => bail!("Invalid total cross section flag {}", flag),
        };

        let reaction_count = cursor.count()?;
        let mut reactions = Vec::with_capacity(reaction_count);
        for _ in 0..reaction_count {
            let mt = u32::try_from(cursor.count()?).context("MT number out of range")?;
            let q_value = cursor.value()?;
            let threshold_index = cursor.count()?;
            let xs = cursor.array()?;
            reactions.push(ReactionData { mt, q_value, threshold_index, xs });
        }

        let nu = match cursor.count()? {
            0 => None,
            1 => Some(NuData::Polynomial { coefficients: cursor.array()? }),
            2 => {
                let breakpoints = cursor.array()?.into_iter().map(|value| value as usize).collect();
                let schemes = cursor.array()?.into_iter().map(scheme_from_f64).collect::<Result<_>>()?;
                let energy = cursor.array()?;
                let nu = cursor.array()?;
                Some(NuData::Tabulated { breakpoints, schemes, energy, nu })
            }
            tag => bail!("Invalid nu-bar tag {}", tag),
        };

        let fission_spectrum = match cursor.count()? {
            0 => None,
            1 => Some(FissionSpectrum::Watt { a: cursor.value()?, b: cursor.value()? }),
            2 => Some(FissionSpectrum::Maxwell { theta: cursor.value()? }),
            tag => bail!("Invalid fission spectrum tag {}", tag),
        };

        let thermal_count = cursor.count()?;
        let mut thermal = Vec::with_capacity(thermal_count);
        for _ in 0..thermal_count {
            thermal.push(ThermalData {
                temperature: cursor.value()?,
                cutoff: cursor.value()?,
                energy: cursor.array()?,
                elastic: cursor.array()?,
                inelastic: cursor.array()?,
            });
        }

        if cursor.position != cursor.bytes.len() {
            bail!("{} unexpected bytes after the last thermal table", cursor.bytes.len() - cursor.position);
        }

        Ok(IsotopeData {
            name,
            awr,
            temperature,
            interpolation,
            energy,
            total,
            reactions,
            nu,
            fission_spectrum,
            thermal,
        })
    }
}

fn scheme_from_f64(value: f64) -> Result<InterpolationScheme> {
    InterpolationScheme::try_from(value as u8).map_err(|_| anyhow!("Invalid interpolation scheme number {}", value))
}

// Sequential reader over the f64 words of the data section
struct WordCursor<'a> {
    bytes: &'a [u8],
    position: usize,
}

impl WordCursor<'_> {
    fn value(&mut self) -> Result<f64> {
        let end = self.position + 8;
        let chunk = self
            .bytes
            .get(self.position..end)
            .ok_or_else(|| anyhow!("Library is truncated at byte {}", HEADER_LENGTH + self.position))?;
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(chunk);
        self.position = end;
        Ok(f64::from_ne_bytes(bytes))
    }

    fn count(&mut self) -> Result<usize> {
        let value = self.value()?;
        if !(value >= 0.0) || value.fract() != 0.0 {
            bail!("Expected a count, found {}", value);
        }
        Ok(value as usize)
    }

    fn array(&mut self) -> Result<Vec<f64>> {
        let length = self.count()?;
        if length * 8 > self.bytes.len() - self.position {
            bail!("Array of {} values runs past the end of the library", length);
        }
        (0..length).map(|_| self.value()).collect()
    }
}

// Accumulates the data section
struct WordWriter(Vec<u8>);

impl WordWriter {
    fn value(&mut self, value: f64) {
        self.0.extend_from_slice(&value.to_ne_bytes());
    }

    fn count(&mut self, count: usize) {
        self.value(count as f64);
    }

    fn array(&mut self, values: &[f64]) {
        self.count(values.len());
        values.iter().for_each(|&value| self.value(value));
    }
}

// Write an isotope to a binary library file
pub fn write_isotope_library<P: AsRef<Path>>(path: P, data: &IsotopeData) -> Result<()> {
    if !data.name.is_ascii() || data.name.len() > NAME_LENGTH {
        bail!("Isotope name '{}' must be ASCII and at most {} bytes", data.name, NAME_LENGTH);
    }

    let mut header = Vec::with_capacity(HEADER_LENGTH);
    header.extend_from_slice(MAGIC);
    header.extend_from_slice(data.name.as_bytes());
    header.resize(8 + NAME_LENGTH, b' ');
    header.extend_from_slice(&data.awr.to_ne_bytes());
    header.extend_from_slice(&data.temperature.to_ne_bytes());
    header.extend_from_slice(&f64::from(u8::from(data.interpolation)).to_ne_bytes());

    let mut words = WordWriter(Vec::new());
    words.array(&data.energy);
    match &data.total {
        Some(total) => {
            words.count(1);
            words.array(total);
        }
        None => words.count(0),
    }

    words.count(data.reactions.len());
    for reaction in &data.reactions {
        words.count(reaction.mt as usize);
        words.value(reaction.q_value);
        words.count(reaction.threshold_index);
        words.array(&reaction.xs);
    }

    match &data.nu {
        None => words.count(0),
        Some(NuData::Polynomial { coefficients }) => {
            words.count(1);
            words.array(coefficients);
        }
        Some(NuData::Tabulated { breakpoints, schemes, energy, nu }) => {
            words.count(2);
            words.array(&breakpoints.iter().map(|&b| b as f64).collect::<Vec<_>>());
            words.array(&schemes.iter().map(|&s| f64::from(u8::from(s))).collect::<Vec<_>>());
            words.array(energy);
            words.array(nu);
        }
    }

    match data.fission_spectrum {
        None => words.count(0),
        Some(FissionSpectrum::Watt { a, b }) => {
            words.count(1);
            words.value(a);
            words.value(b);
        }
        Some(FissionSpectrum::Maxwell { theta }) => {
            words.count(2);
            words.value(theta);
        }
    }

    words.count(data.thermal.len());
    for table in &data.thermal {
        words.value(table.temperature);
        words.value(table.cutoff);
        words.array(&table.energy);
        words.array(&table.elastic);
        words.array(&table.inelastic);
    }

    let file = File::create(path.as_ref())
        .with_context(|| format!("Failed to create isotope library: {}", path.as_ref().display()))?;
    let mut writer = BufWriter::new(file);
    writer.write_all(&header)?;
    writer.write_all(&words.0)?;
    writer.flush()?;
    Ok(())
}
