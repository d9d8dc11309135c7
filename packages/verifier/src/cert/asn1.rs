//! DER helpers for the structures x509-parser leaves opaque

use der::asn1::UintRef;
use der::{AnyRef, Decode, Encode, Reader, SliceReader, Tag, Tagged};

/// Contents of a DER SEQUENCE, without its tag and length
pub(crate) fn sequence_contents(der: &[u8]) -> Option<&[u8]> {
    let any = match AnyRef::from_der(der) {
        Ok(any) => any,
        Err(e) => {
            tracing::debug!(target: "certverify::cert", error = %e, "Malformed DER value");
            return None;
        }
    };
    (any.tag() == Tag::Sequence).then(|| any.value())
}

/// Wrap `contents` in a DER SEQUENCE header
pub(crate) fn wrap_sequence(contents: &[u8]) -> Option<Vec<u8>> {
    match AnyRef::new(Tag::Sequence, contents).and_then(|any| any.to_der()) {
        Ok(der) => Some(der),
        Err(e) => {
            tracing::warn!(target: "certverify::cert", error = %e, "Failed to encode DER sequence");
            None
        }
    }
}

/// Size of a DSA key: the bit length of the prime `p` carried in the
/// Dss-Parms of the algorithm identifier. `None` when the parameters are
/// absent (inherited from the issuer) or malformed.
pub(crate) fn dsa_prime_bits(spki_der: &[u8]) -> Option<u32> {
    let mut spki = SliceReader::new(sequence_contents(spki_der)?).ok()?;
    let algorithm: AnyRef<'_> = spki.decode().ok()?;
    if algorithm.tag() != Tag::Sequence {
        return None;
    }

    let mut algorithm = SliceReader::new(algorithm.value()).ok()?;
    let _oid: AnyRef<'_> = algorithm.decode().ok()?;
    let params: AnyRef<'_> = algorithm.decode().ok()?;
    if params.tag() != Tag::Sequence {
        return None;
    }

    let mut params = SliceReader::new(params.value()).ok()?;
    let prime: UintRef<'_> = params.decode().ok()?;
    Some(integer_bits(prime.as_bytes()))
}

/// Bit length of a big-endian unsigned integer
pub(crate) fn integer_bits(bytes: &[u8]) -> u32 {
    let Some(first) = bytes.iter().position(|b| *b != 0) else {
        return 0;
    };
    let significant = u32::try_from(bytes.len() - first).unwrap_or(u32::MAX / 8);
    significant * 8 - bytes[first].leading_zeros()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn tlv(tag: Tag, contents: &[u8]) -> Vec<u8> {
        AnyRef::new(tag, contents).unwrap().to_der().unwrap()
    }

    pub(crate) fn integer(magnitude: &[u8]) -> Vec<u8> {
        UintRef::new(magnitude).unwrap().to_der().unwrap()
    }

    const DSA_OID: [u8; 7] = [0x2a, 0x86, 0x48, 0xce, 0x38, 0x04, 0x01];

    /// SubjectPublicKeyInfo for a DSA key with the given parameters and
    /// public value
    pub(crate) fn dsa_spki(p: &[u8], q: &[u8], g: &[u8], y: &[u8]) -> Vec<u8> {
        let params = tlv(Tag::Sequence, &[integer(p), integer(q), integer(g)].concat());
        let algorithm = tlv(
            Tag::Sequence,
            &[tlv(Tag::ObjectIdentifier, &DSA_OID), params].concat(),
        );
        let key = tlv(Tag::BitString, &[vec![0x00], integer(y)].concat());
        tlv(Tag::Sequence, &[algorithm, key].concat())
    }

    pub(crate) fn dsa_1024_with_short_y() -> Vec<u8> {
        let mut p = vec![0xc5; 128];
        p[0] = 0xf1;
        let mut y = vec![0x3d; 128];
        y[0] = 0x40;
        dsa_spki(&p, &[0x9b; 20], &[0x02; 128], &y)
    }

    #[test]
    fn integer_bits_ignores_leading_zero_bytes() {
        assert_eq!(integer_bits(&[0x00, 0x80, 0x00]), 16);
        assert_eq!(integer_bits(&[0x01]), 1);
        assert_eq!(integer_bits(&[0x00, 0x00]), 0);
        assert_eq!(integer_bits(&[0x7f, 0xff]), 15);
    }

    #[test]
    fn sequence_header_round_trips_for_long_lengths() {
        let contents = vec![0xab; 300];
        let wrapped = wrap_sequence(&contents).unwrap();
        assert_eq!(&wrapped[..4], &[0x30, 0x82, 0x01, 0x2c]);
        assert_eq!(sequence_contents(&wrapped), Some(contents.as_slice()));
        assert_eq!(sequence_contents(&[0x31, 0x00]), None);
        assert_eq!(sequence_contents(&[0x30, 0x05, 0x00]), None);
    }

    #[test]
    fn dsa_size_comes_from_the_prime_not_the_public_value() {
        assert_eq!(dsa_prime_bits(&dsa_1024_with_short_y()), Some(1024));

        let mut p = vec![0xff; 256];
        p[0] = 0x7f;
        let spki = dsa_spki(&p, &[0x9b; 32], &[0x02; 256], &[0x01]);
        assert_eq!(dsa_prime_bits(&spki), Some(2047));
    }

    #[test]
    fn dsa_without_parameters_has_no_size() {
        let algorithm = tlv(Tag::Sequence, &tlv(Tag::ObjectIdentifier, &DSA_OID));
        let key = tlv(Tag::BitString, &[vec![0x00], integer(&[0x40; 128])].concat());
        let spki = tlv(Tag::Sequence, &[algorithm, key].concat());
        assert_eq!(dsa_prime_bits(&spki), None);
    }
}
