// firewatch_core/src/snapshot/handoff.rs

//! Compact, URL-safe text form of a snapshot for passing between devices.
//!
//! Layout before base64url (no padding), all integers big-endian:
//!
//! | field               | bytes                |
//! |---------------------|----------------------|
//! | magic `FW`          | 2                    |
//! | version             | 1                    |
//! | latitude            | 8 (f64)              |
//! | longitude           | 8 (f64)              |
//! | accuracy            | 8 (f64)              |
//! | captured_at seconds | 8 (i64)              |
//! | captured_at nanos   | 4 (u32)              |
//! | address             | 4 (u32 len) + UTF-8  |
//! | device tag          | 4 (u32 len) + UTF-8  |

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use chrono::DateTime;
use std::fmt;
use url::Url;

use super::LocationSnapshot;
use crate::error::HandoffError;

const MAGIC: &[u8; 2] = b"FW";
const VERSION: u8 = 1;
const SHARE_QUERY_KEY: &str = "loc";

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HandoffToken(String);

impl HandoffToken {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `base` with the token in its `loc` query parameter. Existing `loc`
    /// parameters are replaced; others are kept.
    pub fn share_link(&self, base: &Url) -> Url {
        let mut link = base.clone();
        let kept: Vec<(String, String)> = base
            .query_pairs()
            .filter(|(key, _)| key != SHARE_QUERY_KEY)
            .map(|(key, value)| (key.into_owned(), value.into_owned()))
            .collect();
        {
            let mut query = link.query_pairs_mut();
            query.clear();
            for (key, value) in &kept {
                query.append_pair(key, value);
            }
            query.append_pair(SHARE_QUERY_KEY, &self.0);
        }
        link
    }

    /// The token carried by a share link, if any.
    pub fn from_share_link(link: &Url) -> Option<Self> {
        link.query_pairs()
            .find(|(key, _)| key == SHARE_QUERY_KEY)
            .map(|(_, value)| Self(value.into_owned()))
    }
}

impl fmt::Display for HandoffToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

pub fn encode_handoff(snapshot: &LocationSnapshot) -> HandoffToken {
    let address = snapshot.approximate_address.as_bytes();
    let device = snapshot.device_tag.as_bytes();

    let mut bytes = Vec::with_capacity(2 + 1 + 8 * 4 + 4 + 8 + address.len() + device.len());
    bytes.extend_from_slice(MAGIC);
    bytes.push(VERSION);
    bytes.extend_from_slice(&snapshot.latitude.to_be_bytes());
    bytes.extend_from_slice(&snapshot.longitude.to_be_bytes());
    bytes.extend_from_slice(&snapshot.accuracy_meters.to_be_bytes());
    bytes.extend_from_slice(&snapshot.captured_at.timestamp().to_be_bytes());
    bytes.extend_from_slice(&snapshot.captured_at.timestamp_subsec_nanos().to_be_bytes());
    push_text(&mut bytes, address);
    push_text(&mut bytes, device);

    HandoffToken(URL_SAFE_NO_PAD.encode(bytes))
}

/// Decodes a token. Surrounding whitespace is ignored; anything else that
/// does not match the layout exactly is rejected.
pub fn decode_handoff(token: &str) -> Result<LocationSnapshot, HandoffError> {
    let bytes = URL_SAFE_NO_PAD
        .decode(token.trim())
        .map_err(|_| HandoffError::Encoding)?;
    let mut reader = Reader { bytes: &bytes, pos: 0 };

    if reader.take(MAGIC.len(), "magic")? != MAGIC {
        return Err(HandoffError::BadMagic);
    }
    let version = reader.take(1, "version")?[0];
    if version != VERSION {
        return Err(HandoffError::UnsupportedVersion(version));
    }

    let latitude = reader.f64("latitude")?;
    let longitude = reader.f64("longitude")?;
    let accuracy_meters = reader.f64("accuracy")?;
    let seconds = i64::from_be_bytes(reader.array("captured_at")?);
    let nanos = u32::from_be_bytes(reader.array("captured_at")?);
    let approximate_address = reader.text("address")?;
    let device_tag = reader.text("device_tag")?;

    if reader.remaining() > 0 {
        return Err(HandoffError::TrailingBytes(reader.remaining()));
    }

    if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
        return Err(HandoffError::InvalidField("latitude"));
    }
    if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
        return Err(HandoffError::InvalidField("longitude"));
    }
    if !accuracy_meters.is_finite() || accuracy_meters < 0.0 {
        return Err(HandoffError::InvalidField("accuracy"));
    }
    // Leap seconds carry nanos past 1e9; chrono decides which are legal.
    let captured_at =
        DateTime::from_timestamp(seconds, nanos).ok_or(HandoffError::InvalidField("captured_at"))?;

    Ok(LocationSnapshot {
        latitude,
        longitude,
        accuracy_meters,
        approximate_address,
        captured_at,
        device_tag,
    })
}

fn push_text(bytes: &mut Vec<u8>, text: &[u8]) {
    // Snapshot strings are short; anything past u32::MAX is cut off.
    let len = u32::try_from(text.len()).unwrap_or(u32::MAX);
    bytes.extend_from_slice(&len.to_be_bytes());
    bytes.extend_from_slice(&text[..len as usize]);
}

struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn remaining(&self) -> usize {
        self.bytes.len() - self.pos
    }

    fn take(&mut self, n: usize, field: &'static str) -> Result<&'a [u8], HandoffError> {
        if self.remaining() < n {
            return Err(HandoffError::Truncated(field));
        }
        let slice = &self.bytes[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    fn array<const N: usize>(&mut self, field: &'static str) -> Result<[u8; N], HandoffError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N, field)?);
        Ok(out)
    }

    fn f64(&mut self, field: &'static str) -> Result<f64, HandoffError> {
        Ok(f64::from_be_bytes(self.array(field)?))
    }

    fn text(&mut self, field: &'static str) -> Result<String, HandoffError> {
        let len = u32::from_be_bytes(self.array(field)?) as usize;
        let raw = self.take(len, field)?;
        std::str::from_utf8(raw)
            .map(str::to_string)
            .map_err(|_| HandoffError::InvalidText(field))
    }
}
