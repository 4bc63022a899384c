//! Lazy readers for documents made of several JSON values written back to back, e.g.
//!
//! ```text
//! {"a": 1}
//! {"a": 2}{"a": 3}
//! ```
//!
//! Values are decoded one at a time. A source can be iterated any number of times; every call to
//! `iter` starts again at the beginning of the document.

use std::{
    fs::File,
    io::{self, BufReader, Read},
    marker::PhantomData,
    path::{Path, PathBuf},
};

use serde::de::DeserializeOwned;
use serde_json::{de::IoRead, StreamDeserializer};

/// Iterator over the values of a stacked JSON document.
///
/// The iterator stops after the first error. Whitespace between (and after) values is skipped.
pub struct JsonStream<'de, R: Read, T> {
    inner: StreamDeserializer<'de, IoRead<R>, T>,
}

impl<R: Read, T: DeserializeOwned> JsonStream<'_, R, T> {
    pub fn new(reader: R) -> Self {
        Self {
            inner: serde_json::Deserializer::from_reader(reader).into_iter(),
        }
    }
}

impl<R: Read, T: DeserializeOwned> Iterator for JsonStream<'_, R, T> {
    type Item = Result<T, serde_json::Error>;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }
}

/// A stacked JSON document stored in a file. Each call to `iter` reopens the file.
#[derive(Debug)]
pub struct JsonFile<T> {
    path: PathBuf,
    _ty: PhantomData<fn() -> T>,
}

impl<T> Clone for JsonFile<T> {
    fn clone(&self) -> Self {
        Self {
            path: self.path.clone(),
            _ty: PhantomData,
        }
    }
}

impl<T: DeserializeOwned> JsonFile<T> {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            _ty: PhantomData,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Open the file and return a lazy iterator over its values.
    pub fn iter(&self) -> io::Result<JsonStream<'static, BufReader<File>, T>> {
        log::debug!("Reading stacked JSON from {:?}", self.path);
        Ok(JsonStream::new(BufReader::new(File::open(&self.path)?)))
    }
}

/// A stacked JSON document held in memory.
#[derive(Debug)]
pub struct JsonStr<'a, T> {
    document: &'a str,
    _ty: PhantomData<fn() -> T>,
}

impl<T> Clone for JsonStr<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for JsonStr<'_, T> {}

impl<'a, T: DeserializeOwned> JsonStr<'a, T> {
    pub fn new(document: &'a str) -> Self {
        Self {
            document,
            _ty: PhantomData,
        }
    }

    pub fn iter(&self) -> JsonStream<'static, &'a [u8], T> {
        JsonStream::new(self.document.as_bytes())
    }
}
