//! Chunked streaming AEAD
//!
//! XChaCha20-Poly1305 in the STREAM construction. A 24-byte stream header is
//! written before the first chunk; its leading 19 bytes seed the nonce
//! prefix, and a 4-byte big-endian counter plus a last-block flag complete
//! each per-chunk nonce. The full 24-byte header is also bound to every
//! chunk as associated data, so no header byte is malleable. Plaintext is
//! sealed in 4096-byte chunks, each with its own 16-byte tag. The chunk that
//! consumes the last plaintext bytes is sealed with the last-block flag, so
//! truncating the file at a chunk boundary fails authentication just like a
//! flipped byte does.
//!
//! Both directions work over async byte streams and close the sink on every
//! exit path, error or success. Cipher state is single-use per call.

use chacha20poly1305::{
    aead::generic_array::GenericArray,
    aead::stream::{DecryptorBE32, EncryptorBE32},
    aead::Payload,
    KeyInit, XChaCha20Poly1305,
};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::{error::CryptoError, kdf::CipherKey};

/// Plaintext bytes sealed per chunk.
pub const CHUNK_SIZE: usize = 4096;

/// Poly1305 tag length.
pub const TAG_LEN: usize = 16;

/// Stream header emitted before the first ciphertext chunk.
pub const STREAM_HEADER_LEN: usize = 24;

/// STREAM nonce prefix: 24-byte XChaCha nonce minus the 4-byte counter and
/// the 1-byte last-block flag.
const NONCE_PREFIX_LEN: usize = 19;

const CIPHERTEXT_CHUNK: usize = CHUNK_SIZE + TAG_LEN;

/// Encrypt `input` into `output`: stream header, then tagged chunks.
///
/// A zero-length input still produces a valid stream (header plus one
/// tag-only final chunk). The output stream is shut down on every exit path.
pub async fn encrypt<R, W>(key: &CipherKey, input: &mut R, output: &mut W) -> Result<(), CryptoError>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let result = encrypt_inner(key, input, output).await;
    let closed = output.shutdown().await;
    result?;
    closed?;
    Ok(())
}

async fn encrypt_inner<R, W>(
    key: &CipherKey,
    input: &mut R,
    output: &mut W,
) -> Result<(), CryptoError>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut header = [0u8; STREAM_HEADER_LEN];
    {
        use rand::RngCore;
        rand::rngs::OsRng.fill_bytes(&mut header);
    }
    output.write_all(&header).await?;

    let cipher =
        XChaCha20Poly1305::new_from_slice(&key.0).map_err(|_| CryptoError::AeadEncrypt)?;
    let nonce = GenericArray::from_slice(&header[..NONCE_PREFIX_LEN]);
    let mut enc = EncryptorBE32::from_aead(cipher, nonce);

    // One chunk of lookahead: a chunk is only sealed as "continue" once the
    // next read proves more plaintext follows.
    let mut cur = vec![0u8; CHUNK_SIZE];
    let mut next = vec![0u8; CHUNK_SIZE];
    let mut cur_len = read_full(input, &mut cur).await?;

    while cur_len == CHUNK_SIZE {
        let next_len = read_full(input, &mut next).await?;
        if next_len == 0 {
            break;
        }
        let sealed = enc
            .encrypt_next(Payload {
                msg: &cur[..cur_len],
                aad: &header,
            })
            .map_err(|_| CryptoError::AeadEncrypt)?;
        output.write_all(&sealed).await?;
        std::mem::swap(&mut cur, &mut next);
        cur_len = next_len;
    }

    // `cur` now holds the final chunk: short, full, or empty.
    let sealed = enc
        .encrypt_last(Payload {
            msg: &cur[..cur_len],
            aad: &header,
        })
        .map_err(|_| CryptoError::AeadEncrypt)?;
    output.write_all(&sealed).await?;
    output.flush().await?;
    Ok(())
}

/// Decrypt `input` into `output`, authenticating every chunk.
///
/// Any tag failure aborts the whole run with [`CryptoError::AeadDecrypt`];
/// a stream that ends mid-chunk or before the stream header surfaces as
/// [`CryptoError::TruncatedStream`]. Bytes already written to `output` on a
/// failed run must be discarded by the caller. The output stream is shut
/// down on every exit path.
pub async fn decrypt<R, W>(key: &CipherKey, input: &mut R, output: &mut W) -> Result<(), CryptoError>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let result = decrypt_inner(key, input, output).await;
    let closed = output.shutdown().await;
    result?;
    closed?;
    Ok(())
}

async fn decrypt_inner<R, W>(
    key: &CipherKey,
    input: &mut R,
    output: &mut W,
) -> Result<(), CryptoError>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut header = [0u8; STREAM_HEADER_LEN];
    input.read_exact(&mut header).await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::UnexpectedEof {
            CryptoError::TruncatedStream
        } else {
            CryptoError::Io(e)
        }
    })?;

    let cipher =
        XChaCha20Poly1305::new_from_slice(&key.0).map_err(|_| CryptoError::AeadDecrypt)?;
    let nonce = GenericArray::from_slice(&header[..NONCE_PREFIX_LEN]);
    let mut dec = DecryptorBE32::from_aead(cipher, nonce);

    let mut cur = vec![0u8; CIPHERTEXT_CHUNK];
    let mut next = vec![0u8; CIPHERTEXT_CHUNK];
    let mut cur_len = read_full(input, &mut cur).await?;
    if cur_len < TAG_LEN {
        // Even an empty plaintext has a tag-only final chunk.
        return Err(CryptoError::TruncatedStream);
    }

    while cur_len == CIPHERTEXT_CHUNK {
        let next_len = read_full(input, &mut next).await?;
        if next_len == 0 {
            break;
        }
        if next_len < TAG_LEN {
            return Err(CryptoError::TruncatedStream);
        }
        let plain = dec
            .decrypt_next(Payload {
                msg: &cur[..cur_len],
                aad: &header,
            })
            .map_err(|_| CryptoError::AeadDecrypt)?;
        output.write_all(&plain).await?;
        std::mem::swap(&mut cur, &mut next);
        cur_len = next_len;
    }

    let plain = dec
        .decrypt_last(Payload {
            msg: &cur[..cur_len],
            aad: &header,
        })
        .map_err(|_| CryptoError::AeadDecrypt)?;
    output.write_all(&plain).await?;
    output.flush().await?;
    Ok(())
}

/// Read until `buf` is full or the stream ends. Returns bytes read.
async fn read_full<R>(input: &mut R, buf: &mut [u8]) -> Result<usize, CryptoError>
where
    R: AsyncRead + Unpin,
{
    let mut filled = 0;
    while filled < buf.len() {
        let n = input.read(&mut buf[filled..]).await?;
        if n == 0 {
            break;
        }
        filled += n;
    }
    Ok(filled)
}
