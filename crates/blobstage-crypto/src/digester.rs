use std::io::{self, Read, Write};

use blobstage_types::{Algorithm, Digest};
use sha2::Digest as _;

/// Incremental hasher producing algorithm-tagged digests.
///
/// Bytes are fed with [`Digester::update`] (or through `io::Write`), and
/// [`Digester::digest`] reports the digest of everything fed so far without
/// consuming the state, so it can be called mid-stream.
#[derive(Clone)]
pub struct Digester {
    state: State,
}

#[derive(Clone)]
enum State {
    Sha256(sha2::Sha256),
    Sha512(sha2::Sha512),
    Blake3(Box<blake3::Hasher>),
}

impl Digester {
    /// Create an empty digester for `algorithm`.
    pub fn new(algorithm: Algorithm) -> Self {
        let state = match algorithm {
            Algorithm::Sha256 => State::Sha256(sha2::Sha256::new()),
            Algorithm::Sha512 => State::Sha512(sha2::Sha512::new()),
            Algorithm::Blake3 => State::Blake3(Box::new(blake3::Hasher::new())),
        };
        Self { state }
    }

    /// Digester for the canonical algorithm (SHA-256).
    pub fn canonical() -> Self {
        Self::new(Algorithm::CANONICAL)
    }

    pub fn algorithm(&self) -> Algorithm {
        match self.state {
            State::Sha256(_) => Algorithm::Sha256,
            State::Sha512(_) => Algorithm::Sha512,
            State::Blake3(_) => Algorithm::Blake3,
        }
    }

    /// Feed bytes into the running hash.
    pub fn update(&mut self, data: &[u8]) {
        match &mut self.state {
            State::Sha256(h) => h.update(data),
            State::Sha512(h) => h.update(data),
            State::Blake3(h) => {
                h.update(data);
            }
        }
    }

    /// Digest of all bytes fed since creation or the last reset.
    pub fn digest(&self) -> Digest {
        let algorithm = self.algorithm();
        let raw: Vec<u8> = match &self.state {
            State::Sha256(h) => h.clone().finalize().to_vec(),
            State::Sha512(h) => h.clone().finalize().to_vec(),
            State::Blake3(h) => h.finalize().as_bytes().to_vec(),
        };
        Digest::from_raw(algorithm, &raw).expect("hash output length matches algorithm")
    }

    /// Return to the empty state, keeping the algorithm.
    pub fn reset(&mut self) {
        *self = Self::new(self.algorithm());
    }
}

impl Default for Digester {
    fn default() -> Self {
        Self::canonical()
    }
}

impl std::fmt::Debug for Digester {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Digester")
            .field("algorithm", &self.algorithm())
            .finish()
    }
}

impl Write for Digester {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.update(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Hash a byte slice in one shot.
pub fn digest_bytes(algorithm: Algorithm, data: &[u8]) -> Digest {
    let mut digester = Digester::new(algorithm);
    digester.update(data);
    digester.digest()
}

/// Stream a reader to its end through a digester.
pub fn digest_reader<R: Read>(algorithm: Algorithm, mut reader: R) -> io::Result<Digest> {
    let mut digester = Digester::new(algorithm);
    io::copy(&mut reader, &mut digester)?;
    Ok(digester.digest())
}
