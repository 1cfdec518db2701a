use crate::configuration::{Config, Input, Operation};
use crate::errors::{Error, HasherError};
use crate::hasher::{Digest, StreamHasher};
use crate::pcr::{PcrExtender, PcrIndex, PcrReader};
use crate::session::with_session;
use crate::trustroot::{TrustRoot, PCR_BANK};
use log::debug;
use std::fs::File;
use std::io::{self, Read, Write};
use std::path::Path;
use std::result;

// format_bytes renders bytes as space separated lowercase hex pairs
pub fn format_bytes(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|byte| hex::encode([*byte]))
        .collect::<Vec<String>>()
        .join(" ")
}

// run executes the operation of config against root, printing results
// to out
pub fn run<T: TrustRoot + ?Sized>(
    config: &Config,
    root: &mut T,
    out: &mut dyn Write,
) -> result::Result<(), Error> {
    debug!("User provided options: {:?}", config);

    match &config.operation {
        Operation::Dump { index } => dump(*index, root, out),
        Operation::Extend { index, input } => {
            let digest = hash_input(input, config.chunk_size)?;
            extend(*index, &digest, root, out)
        }
    }
}

fn dump<T: TrustRoot + ?Sized>(
    index: PcrIndex,
    root: &mut T,
    out: &mut dyn Write,
) -> result::Result<(), Error> {
    let value = with_session(root, |session| Ok(PcrReader::read(session, index)?))?;
    writeln!(out, "{}", format_bytes(value.as_bytes())).map_err(stdout_error)
}

fn extend<T: TrustRoot + ?Sized>(
    index: PcrIndex,
    digest: &Digest,
    root: &mut T,
    out: &mut dyn Write,
) -> result::Result<(), Error> {
    let outcome = with_session(root, |session| {
        Ok(PcrExtender::extend(session, index, digest)?)
    })?;

    writeln!(out, "Current value for PCR {}:", index)
        .and_then(|_| writeln!(out, "  {}", format_bytes(outcome.before.as_bytes())))
        .and_then(|_| writeln!(out, "Extending PCR {} with data:", index))
        .and_then(|_| writeln!(out, "  {}", format_bytes(digest.as_bytes())))
        .and_then(|_| writeln!(out, "New state for PCR {}:", index))
        .and_then(|_| writeln!(out, "  {}", format_bytes(outcome.after.as_bytes())))
        .map_err(stdout_error)
}

fn hash_input(input: &Input, chunk_size: usize) -> result::Result<Digest, Error> {
    match input {
        Input::Stdin => hash_stream(Path::new("<stdin>"), &mut io::stdin().lock(), chunk_size),
        Input::File(path) => {
            let mut file = File::open(path).map_err(|err| Error::io(path, err))?;
            hash_stream(path, &mut file, chunk_size)
        }
    }
}

fn hash_stream(
    path: &Path,
    stream: &mut dyn Read,
    chunk_size: usize,
) -> result::Result<Digest, Error> {
    let digest = StreamHasher::new(PCR_BANK, chunk_size)
        .and_then(|hasher| hasher.update_from_stream(stream))
        .map_err(|err| match err {
            HasherError::ReadError(source) => Error::io(path, source),
            HasherError::HashError(msg) => Error::HashError(msg),
        })?;
    debug!("digest of {}: {}", path.display(), hex::encode(digest.as_bytes()));
    Ok(digest)
}

fn stdout_error(err: io::Error) -> Error {
    Error::io("<stdout>", err)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bytes_are_space_separated_hex() {
        assert_eq!(format_bytes(&[0x00, 0x0a, 0xff]), "00 0a ff");
        assert_eq!(format_bytes(&[]), "");
    }
}
