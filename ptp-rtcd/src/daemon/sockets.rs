//! Framing for the observation socket: a big-endian u64 length followed by
//! that many bytes of JSON.

use std::{
    fs::Permissions,
    io::{self, ErrorKind},
    os::unix::fs::FileTypeExt,
    path::Path,
};

use tokio::{
    io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt},
    net::UnixListener,
};

const MAX_JSON_MESSAGE_SIZE: u64 = 1 << 20;

pub async fn write_json<T>(stream: &mut (impl AsyncWrite + Unpin), value: &T) -> io::Result<()>
where
    T: serde::Serialize,
{
    // reserve the length prefix, fill it in once the size is known
    let mut message = vec![0u8; 8];
    serde_json::to_writer(&mut message, value)
        .map_err(|e| io::Error::new(ErrorKind::InvalidData, e))?;
    let len = (message.len() - 8) as u64;
    message[..8].copy_from_slice(&len.to_be_bytes());

    stream.write_all(&message).await?;
    stream.flush().await
}

pub async fn read_json<'a, T>(
    stream: &mut (impl AsyncRead + Unpin),
    buffer: &'a mut Vec<u8>,
) -> io::Result<T>
where
    T: serde::Deserialize<'a>,
{
    let len = stream.read_u64().await?;
    let len = usize::try_from(len)
        .ok()
        .filter(|_| len <= MAX_JSON_MESSAGE_SIZE)
        .ok_or_else(|| {
            io::Error::new(
                ErrorKind::InvalidInput,
                format!("message of {len} bytes is too large"),
            )
        })?;

    buffer.clear();
    buffer.resize(len, 0);
    stream.read_exact(buffer).await?;

    serde_json::from_slice(buffer).map_err(|e| io::Error::new(ErrorKind::InvalidInput, e))
}

/// Binds a listener at `path` that anyone with `permissions` can connect to.
pub fn create_unix_socket_with_permissions(
    path: &Path,
    permissions: Permissions,
) -> io::Result<UnixListener> {
    let listener = create_unix_socket(path)?;
    std::fs::set_permissions(path, permissions)?;
    Ok(listener)
}

/// Binds a listener at `path`, replacing a stale socket left by an earlier
/// run. Anything else at `path` is left alone.
fn create_unix_socket(path: &Path) -> io::Result<UnixListener> {
    match std::fs::symlink_metadata(path) {
        Ok(meta) if meta.file_type().is_socket() => std::fs::remove_file(path)?,
        Ok(_) => {
            return Err(io::Error::other(format!(
                "path {} exists but is not a socket",
                path.display()
            )))
        }
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => return Err(e),
    }

    UnixListener::bind(path).map_err(|e| {
        let missing_parent = path.parent().is_some_and(|parent| !parent.exists());
        if missing_parent {
            io::Error::other(format!(
                "could not create observation socket at {}: its directory does not exist",
                path.display()
            ))
        } else {
            io::Error::other(format!(
                "could not create observation socket at {}: {e}",
                path.display()
            ))
        }
    })
}
