//! Binary encoding of Attested Credential Data, Authenticator Data, and the
//! Attestation Object envelope.
//!
//! Pure, deterministic functions: no state, no I/O, write into a
//! caller-supplied fixed-capacity buffer. The Attestation Object's map key
//! order (1, 2, 3) is written explicitly rather than left to a CBOR
//! library's own map-serialization order, so relying parties verifying a
//! signature over these bytes see the same output every time regardless of
//! which CBOR crate produced them (compare the explicit key-ordered
//! `SerializeMap` usage this crate's tests borrow the idiom from).

use heapless::Vec;
use serde::ser::{Serialize, SerializeMap, Serializer as _};

use crate::error::EncodeError;
use crate::types::AuthDataFlags;

/// Attested Credential Data, laid out as `aaguid || be16(credential_length)
/// || credential_id || credential_public_key`.
///
/// `credential_public_key` is opaque COSE-key bytes produced elsewhere; this
/// encoder copies them through verbatim.
pub struct AttestedCredentialData<'a> {
    pub aaguid: [u8; 16],
    pub credential_length: u16,
    pub credential_id: &'a [u8],
    pub credential_public_key: &'a [u8],
}

/// Encode `acd` into `out`, clearing any prior contents first.
pub fn encode_acd<const N: usize>(
    acd: &AttestedCredentialData<'_>,
    out: &mut Vec<u8, N>,
) -> Result<(), EncodeError> {
    if acd.credential_length as usize != acd.credential_id.len() {
        return Err(EncodeError::InvalidLength);
    }

    out.clear();
    out.extend_from_slice(&acd.aaguid)
        .map_err(|_| EncodeError::BufferTooSmall)?;
    out.extend_from_slice(&acd.credential_length.to_be_bytes())
        .map_err(|_| EncodeError::BufferTooSmall)?;
    out.extend_from_slice(acd.credential_id)
        .map_err(|_| EncodeError::BufferTooSmall)?;
    out.extend_from_slice(acd.credential_public_key)
        .map_err(|_| EncodeError::BufferTooSmall)?;
    Ok(())
}

/// Authenticator Data, laid out as `rp_id_hash || flags || be32(sign_count)
/// || [attested_credential_data if AT] || [extensions if ED]`.
///
/// `attested_credential_data` and `extensions` are taken as already-encoded
/// byte slices (the output of [`encode_acd`] and of the external CBOR
/// encoder, respectively) rather than re-serialized here.
pub struct AuthenticatorData<'a> {
    pub rp_id_hash: [u8; 32],
    pub flags: AuthDataFlags,
    pub sign_count: u32,
    pub attested_credential_data: Option<&'a [u8]>,
    pub extensions: Option<&'a [u8]>,
}

/// Encode `ad` into `out`, clearing any prior contents first.
pub fn encode_authdata<const N: usize>(
    ad: &AuthenticatorData<'_>,
    out: &mut Vec<u8, N>,
) -> Result<(), EncodeError> {
    let at = ad.flags.contains(AuthDataFlags::ATTESTED_CREDENTIAL_DATA);
    let ed = ad.flags.contains(AuthDataFlags::EXTENSION_DATA);
    if at != ad.attested_credential_data.is_some() {
        return Err(EncodeError::InvalidState);
    }
    if ed != ad.extensions.is_some() {
        return Err(EncodeError::InvalidState);
    }

    out.clear();
    out.extend_from_slice(&ad.rp_id_hash)
        .map_err(|_| EncodeError::BufferTooSmall)?;
    out.push(ad.flags.bits())
        .map_err(|_| EncodeError::BufferTooSmall)?;
    out.extend_from_slice(&ad.sign_count.to_be_bytes())
        .map_err(|_| EncodeError::BufferTooSmall)?;
    if let Some(acd_bytes) = ad.attested_credential_data {
        out.extend_from_slice(acd_bytes)
            .map_err(|_| EncodeError::BufferTooSmall)?;
    }
    if let Some(ext_bytes) = ad.extensions {
        out.extend_from_slice(ext_bytes)
            .map_err(|_| EncodeError::BufferTooSmall)?;
    }
    Ok(())
}

/// An empty CBOR map (`0xA0`), the `attStmt` value for the `none`
/// attestation format.
pub struct EmptyAttestationStatement;

impl Serialize for EmptyAttestationStatement {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        SerializeMap::end(serializer.serialize_map(Some(0))?)
    }
}

struct RawBytes<'a>(&'a [u8]);

impl<'a> Serialize for RawBytes<'a> {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_bytes(self.0)
    }
}

/// Encode the Attestation Object: a CBOR map of exactly three entries with
/// integer keys `1` (`fmt`), `2` (`authData`), `3` (`attStmt`), written in
/// that order into `out`.
///
/// `attstmt` is serialized as-is — for the `none` format, pass
/// [`EmptyAttestationStatement`]; other formats (signature-bearing
/// statements) are out of scope here and are the caller's responsibility to
/// model as a `Serialize` type with the right shape.
///
/// Serializes into a stack buffer via `serde_cbor`'s `SliceWrite`, then
/// copies the written bytes into `out` — the same two-step shape the
/// reference COSE-key serializers use, rather than writing through a
/// `heapless::Vec` directly.
pub fn encode_attestation_object<const N: usize, S: Serialize>(
    fmt: &str,
    authdata: &[u8],
    attstmt: &S,
    out: &mut Vec<u8, N>,
) -> Result<(), EncodeError> {
    let mut buffer = [0u8; N];
    let writer = serde_cbor::ser::SliceWrite::new(&mut buffer);
    let mut serializer = serde_cbor::Serializer::new(writer);

    let mut map = serializer
        .serialize_map(Some(3))
        .map_err(|_| EncodeError::BufferTooSmall)?;
    map.serialize_key(&1u8).map_err(|_| EncodeError::BufferTooSmall)?;
    map.serialize_value(fmt).map_err(|_| EncodeError::BufferTooSmall)?;
    map.serialize_key(&2u8).map_err(|_| EncodeError::BufferTooSmall)?;
    map.serialize_value(&RawBytes(authdata))
        .map_err(|_| EncodeError::BufferTooSmall)?;
    map.serialize_key(&3u8).map_err(|_| EncodeError::BufferTooSmall)?;
    map.serialize_value(attstmt).map_err(|_| EncodeError::BufferTooSmall)?;
    map.end().map_err(|_| EncodeError::BufferTooSmall)?;

    let writer = serializer.into_inner();
    let size = writer.bytes_written();

    out.clear();
    out.extend_from_slice(&buffer[..size])
        .map_err(|_| EncodeError::BufferTooSmall)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn acd_layout_matches_concatenation() {
        let aaguid = [0u8; 16];
        let credential_id = [0x11u8; 64];
        let cose_key = hex_literal::hex!("A5 01 02 03 26 20 01 21 58 20");
        let acd = AttestedCredentialData {
            aaguid,
            credential_length: 64,
            credential_id: &credential_id,
            credential_public_key: &cose_key,
        };

        let mut out = heapless::Vec::<u8, 256>::new();
        encode_acd(&acd, &mut out).unwrap();

        assert_eq!(&out[0..16], &[0u8; 16]);
        assert_eq!(&out[16..18], &[0x00, 0x40]);
        assert_eq!(&out[18..82], &credential_id);
        assert_eq!(&out[82..], &cose_key);
    }

    #[test]
    fn acd_rejects_mismatched_declared_length() {
        let acd = AttestedCredentialData {
            aaguid: [0u8; 16],
            credential_length: 10,
            credential_id: &[0u8; 4],
            credential_public_key: &[],
        };
        let mut out = heapless::Vec::<u8, 64>::new();
        assert_eq!(encode_acd(&acd, &mut out), Err(EncodeError::InvalidLength));
    }

    #[test]
    fn authdata_layout_with_attested_credential_data() {
        let rp_id_hash = hex_literal::hex!(
            "21 09 18 00 00 00 00 00 00 00 00 00 00 00 00 00
             00 00 00 00 00 00 00 00 00 00 00 00 00 00 0E 97"
        );
        let acd_bytes = [0xAAu8; 20];
        let ad = AuthenticatorData {
            rp_id_hash,
            flags: AuthDataFlags::USER_PRESENT | AuthDataFlags::ATTESTED_CREDENTIAL_DATA,
            sign_count: 0,
            attested_credential_data: Some(&acd_bytes),
            extensions: None,
        };

        let mut out = heapless::Vec::<u8, 128>::new();
        encode_authdata(&ad, &mut out).unwrap();

        assert_eq!(&out[0..32], &rp_id_hash);
        assert_eq!(out[32], 0x41);
        assert_eq!(&out[33..37], &[0, 0, 0, 0]);
        assert_eq!(&out[37..], &acd_bytes);
    }

    #[test]
    fn authdata_rejects_at_flag_without_acd_bytes() {
        let ad = AuthenticatorData {
            rp_id_hash: [0u8; 32],
            flags: AuthDataFlags::ATTESTED_CREDENTIAL_DATA,
            sign_count: 0,
            attested_credential_data: None,
            extensions: None,
        };
        let mut out = heapless::Vec::<u8, 64>::new();
        assert_eq!(encode_authdata(&ad, &mut out), Err(EncodeError::InvalidState));
    }

    #[test]
    fn attestation_object_none_format_has_empty_attstmt() {
        let authdata = [0x01u8; 37];
        let mut out = heapless::Vec::<u8, 64>::new();
        encode_attestation_object("none", &authdata, &EmptyAttestationStatement, &mut out).unwrap();

        assert_eq!(out[0], 0xA3); // map of 3 pairs
        assert_eq!(out[1], 0x01); // key 1
        assert_eq!(out[2], 0x64); // text string, length 4
        assert_eq!(&out[3..7], b"none");
        assert_eq!(out[7], 0x02); // key 2
        assert_eq!(out[8], 0x58); // byte string, 1-byte length follows
        assert_eq!(out[9], 37);
        assert_eq!(&out[10..47], &authdata);
        assert_eq!(out[47], 0x03); // key 3
        assert_eq!(out[48], 0xA0); // empty map
        assert_eq!(out.len(), 49);
    }
}
