use std::io::Write;

use memfs_kit::{FsError, MemFS, Whence};

fn main() -> anyhow::Result<()> {
    env_logger::init();

    // registry with two fixtures; paths are relative and slash-separated
    let mut fs = MemFS::with_files([
        ("docs/first.txt", b"Hello".to_vec()),
        ("second.txt", b"Moscow".to_vec()),
    ])?;

    // open returns a handle over a copy of the stored content
    let mut first = fs.open("docs/first.txt")?;
    first.write(b", ")?;

    let mut second = fs.open("second.txt")?;
    second.write_at(b"World!", 0)?;

    // copy the unread part of both handles to stdout
    let mut stdout = std::io::stdout();
    first.write_to(&mut stdout)?;
    second.write_to(&mut stdout)?;
    writeln!(stdout)?;

    // rewind and read again
    second.seek(0, Whence::Start)?;
    let mut buf = [0u8; 5];
    let n = second.read(&mut buf)?;
    assert_eq!(&buf[..n], b"World");

    first.close()?;
    assert!(matches!(first.close(), Err(FsError::Closed { .. })));

    // handle content goes back to the registry only on request
    fs.insert("second.txt", second.into_bytes())?;
    assert_eq!(fs.read("second.txt")?, b"World!");

    assert!(matches!(
        fs.open("../etc/passwd"),
        Err(FsError::InvalidPath { .. })
    ));
    Ok(())
}
