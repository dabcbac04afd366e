/// EXIF metadata extraction for uploaded photos
///
/// Extraction never fails the upload: unreadable or missing EXIF simply yields
/// empty metadata.

use chrono::NaiveDateTime;
use exif::{Exif, In, Reader, Tag, Value};
use std::io::Cursor;

use crate::domain::PhotoMetadata;

/// Read capture time, camera, dimensions, orientation and GPS position
pub fn extract(bytes: &[u8]) -> PhotoMetadata {
    let exif = match Reader::new().read_from_container(&mut Cursor::new(bytes)) {
        Ok(exif) => exif,
        Err(e) => {
            tracing::debug!("No EXIF metadata found: {}", e);
            return PhotoMetadata::default();
        }
    };

    PhotoMetadata {
        taken_at: ascii_field(&exif, Tag::DateTimeOriginal)
            .or_else(|| ascii_field(&exif, Tag::DateTime))
            .and_then(|raw| parse_exif_datetime(&raw)),
        camera_make: ascii_field(&exif, Tag::Make),
        camera_model: ascii_field(&exif, Tag::Model),
        width: uint_field(&exif, Tag::PixelXDimension).or_else(|| uint_field(&exif, Tag::ImageWidth)),
        height: uint_field(&exif, Tag::PixelYDimension).or_else(|| uint_field(&exif, Tag::ImageLength)),
        orientation: uint_field(&exif, Tag::Orientation),
        latitude: gps_coordinate(&exif, Tag::GPSLatitude, Tag::GPSLatitudeRef),
        longitude: gps_coordinate(&exif, Tag::GPSLongitude, Tag::GPSLongitudeRef),
    }
}

fn ascii_field(exif: &Exif, tag: Tag) -> Option<String> {
    let field = exif.get_field(tag, In::PRIMARY)?;
    match &field.value {
        Value::Ascii(parts) => {
            let text = parts
                .iter()
                .map(|part| String::from_utf8_lossy(part).into_owned())
                .collect::<Vec<_>>()
                .join(" ");
            let text = text.trim_matches(|c: char| c == '\0' || c.is_whitespace());
            (!text.is_empty()).then(|| text.to_string())
        }
        _ => None,
    }
}

fn uint_field(exif: &Exif, tag: Tag) -> Option<u32> {
    exif.get_field(tag, In::PRIMARY)?.value.get_uint(0)
}

fn gps_coordinate(exif: &Exif, value_tag: Tag, ref_tag: Tag) -> Option<f64> {
    let field = exif.get_field(value_tag, In::PRIMARY)?;
    let parts: Vec<f64> = match &field.value {
        Value::Rational(rationals) => rationals.iter().map(|r| r.to_f64()).collect(),
        _ => return None,
    };
    let reference = ascii_field(exif, ref_tag);
    dms_to_decimal(&parts, reference.as_deref())
}

/// Degrees/minutes/seconds to signed decimal degrees.
/// "S" and "W" references make the result negative.
pub fn dms_to_decimal(parts: &[f64], reference: Option<&str>) -> Option<f64> {
    let degrees = *parts.first()?;
    let minutes = parts.get(1).copied().unwrap_or(0.0);
    let seconds = parts.get(2).copied().unwrap_or(0.0);
    let value = degrees + minutes / 60.0 + seconds / 3600.0;
    if !value.is_finite() {
        return None;
    }

    let negative = matches!(reference.map(str::trim), Some("S") | Some("W"));
    let value = if negative { -value } else { value };
    Some((value * 1_000_000.0).round() / 1_000_000.0)
}

/// EXIF timestamps use "YYYY:MM:DD HH:MM:SS"
pub fn parse_exif_datetime(raw: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(raw.trim(), "%Y:%m:%d %H:%M:%S").ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, NaiveDate, Timelike};

    const ASCII: u16 = 2;
    const SHORT: u16 = 3;
    const LONG: u16 = 4;
    const RATIONAL: u16 = 5;

    struct Entry {
        tag: u16,
        kind: u16,
        count: u32,
        data: Vec<u8>,
    }

    fn ascii(tag: u16, text: &str) -> Entry {
        let mut data = text.as_bytes().to_vec();
        data.push(0);
        Entry { tag, kind: ASCII, count: data.len() as u32, data }
    }

    fn short(tag: u16, value: u16) -> Entry {
        Entry { tag, kind: SHORT, count: 1, data: value.to_le_bytes().to_vec() }
    }

    fn long(tag: u16, value: u32) -> Entry {
        Entry { tag, kind: LONG, count: 1, data: value.to_le_bytes().to_vec() }
    }

    fn rationals(tag: u16, values: &[(u32, u32)]) -> Entry {
        let data = values
            .iter()
            .flat_map(|(num, denom)| num.to_le_bytes().into_iter().chain(denom.to_le_bytes()))
            .collect();
        Entry { tag, kind: RATIONAL, count: values.len() as u32, data }
    }

    fn ifd_len(entries: &[Entry]) -> usize {
        let overflow: usize = entries.iter().filter(|e| e.data.len() > 4).map(|e| e.data.len()).sum();
        2 + 12 * entries.len() + 4 + overflow
    }

    /// Append an IFD; values longer than four bytes follow the entry table
    fn write_ifd(out: &mut Vec<u8>, entries: &[Entry]) {
        let mut overflow_offset = out.len() + 2 + 12 * entries.len() + 4;
        let mut overflow: Vec<u8> = Vec::new();
        out.extend((entries.len() as u16).to_le_bytes());
        for entry in entries {
            out.extend(entry.tag.to_le_bytes());
            out.extend(entry.kind.to_le_bytes());
            out.extend(entry.count.to_le_bytes());
            if entry.data.len() <= 4 {
                let mut inline = entry.data.clone();
                inline.resize(4, 0);
                out.extend(inline);
            } else {
                out.extend((overflow_offset as u32).to_le_bytes());
                overflow_offset += entry.data.len();
                overflow.extend(&entry.data);
            }
        }
        out.extend(0u32.to_le_bytes());
        out.extend(overflow);
    }

    /// Minimal JPEG with an APP1 EXIF segment; GPS position is south and west
    fn jpeg_with_exif() -> Vec<u8> {
        let exif_ifd = vec![
            ascii(0x9003, "2026:03:14 09:26:53"),
            long(0xA002, 4000),
            long(0xA003, 3000),
        ];
        let gps_ifd = vec![
            ascii(0x0001, "S"),
            rationals(0x0002, &[(33, 1), (52, 1), (48, 10)]),
            ascii(0x0003, "W"),
            rationals(0x0004, &[(2, 1), (17, 1), (402, 10)]),
        ];
        let mut ifd0 = vec![
            ascii(0x010F, "Canon"),
            ascii(0x0110, "EOS R6"),
            short(0x0112, 6),
            long(0x8769, 0),
            long(0x8825, 0),
        ];
        let exif_offset = 8 + ifd_len(&ifd0);
        let gps_offset = exif_offset + ifd_len(&exif_ifd);
        ifd0[3] = long(0x8769, exif_offset as u32);
        ifd0[4] = long(0x8825, gps_offset as u32);

        let mut tiff = b"II".to_vec();
        tiff.extend(42u16.to_le_bytes());
        tiff.extend(8u32.to_le_bytes());
        write_ifd(&mut tiff, &ifd0);
        write_ifd(&mut tiff, &exif_ifd);
        write_ifd(&mut tiff, &gps_ifd);

        let segment_len = (2 + 6 + tiff.len()) as u16;
        let mut jpeg = vec![0xFF, 0xD8, 0xFF, 0xE1];
        jpeg.extend(segment_len.to_be_bytes());
        jpeg.extend(b"Exif\0\0");
        jpeg.extend(tiff);
        jpeg.extend([0xFF, 0xD9]);
        jpeg
    }

    #[test]
    fn reads_every_field_from_an_exif_block() {
        let metadata = extract(&jpeg_with_exif());

        let taken = NaiveDate::from_ymd_opt(2026, 3, 14)
            .unwrap()
            .and_hms_opt(9, 26, 53)
            .unwrap();
        assert_eq!(metadata.taken_at, Some(taken));
        assert_eq!(metadata.camera_make.as_deref(), Some("Canon"));
        assert_eq!(metadata.camera_model.as_deref(), Some("EOS R6"));
        assert_eq!(metadata.width, Some(4000));
        assert_eq!(metadata.height, Some(3000));
        assert_eq!(metadata.orientation, Some(6));
        assert_eq!(metadata.latitude, Some(-33.868));
        assert_eq!(metadata.longitude, Some(-2.294_5));
    }

    #[test]
    fn dms_conversion_and_hemisphere() {
        let north = dms_to_decimal(&[48.0, 51.0, 29.52], Some("N")).unwrap();
        assert_eq!(north, 48.858_2);
        let west = dms_to_decimal(&[2.0, 17.0, 40.2], Some("W")).unwrap();
        assert_eq!(west, -2.294_5);
        assert_eq!(dms_to_decimal(&[], Some("N")), None);
        assert_eq!(dms_to_decimal(&[10.0], None), Some(10.0));
    }

    #[test]
    fn parses_exif_timestamps() {
        let parsed = parse_exif_datetime("2026:03:14 09:26:53").unwrap();
        assert_eq!((parsed.year(), parsed.month(), parsed.day()), (2026, 3, 14));
        assert_eq!((parsed.hour(), parsed.minute()), (9, 26));
        assert!(parse_exif_datetime("0000:00:00 00:00:00").is_none());
    }

    #[test]
    fn non_images_yield_empty_metadata() {
        assert!(extract(b"definitely not a jpeg").is_empty());
        assert!(extract(&[]).is_empty());
    }
}
