//! The uniform form representation every decoder produces.

use crate::file::UploadedFile;
use serde::Serialize;
use std::collections::HashMap;
use std::collections::hash_map;

/// Field name to the values submitted for it, in the order they appeared in the body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FormValues {
    inner: HashMap<String, Vec<String>>,
}

impl FormValues {
    pub fn new() -> Self {
        Self::default()
    }

    /// All values submitted for `name`.
    pub fn get(&self, name: &str) -> Option<&[String]> {
        self.inner.get(name).map(Vec::as_slice)
    }

    /// The first value submitted for `name`.
    pub fn first(&self, name: &str) -> Option<&str> {
        self.inner.get(name).and_then(|values| values.first()).map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.inner.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.inner.keys().map(String::as_str)
    }

    pub fn iter(&self) -> hash_map::Iter<'_, String, Vec<String>> {
        self.inner.iter()
    }

    /// Appends `value` after any values already present for `name`.
    pub fn append(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.inner.entry(name.into()).or_default().push(value.into());
    }

    /// Replaces every value of `name`, returning the previous ones.
    pub fn insert(&mut self, name: impl Into<String>, values: Vec<String>) -> Option<Vec<String>> {
        self.inner.insert(name.into(), values)
    }

    /// Drops the fields that carry no answer.
    ///
    /// Browsers send unanswered optional inputs either as an empty string or not at all,
    /// depending on the encoding. After this call both cases look the same: the field is
    /// absent. A field is dropped when it has no values, or exactly one value that is
    /// the empty string.
    pub fn reduce_unanswered(&mut self) {
        self.inner.retain(|_, values| match values.as_slice() {
            [] => false,
            [only] => !only.is_empty(),
            _ => true,
        });
    }

    pub fn into_inner(self) -> HashMap<String, Vec<String>> {
        self.inner
    }
}

impl From<HashMap<String, Vec<String>>> for FormValues {
    fn from(inner: HashMap<String, Vec<String>>) -> Self {
        Self { inner }
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for FormValues {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut values = FormValues::new();
        for (name, value) in iter {
            values.append(name, value);
        }
        values
    }
}

impl<'a> IntoIterator for &'a FormValues {
    type Item = (&'a String, &'a Vec<String>);
    type IntoIter = hash_map::Iter<'a, String, Vec<String>>;

    fn into_iter(self) -> Self::IntoIter {
        self.inner.iter()
    }
}

impl IntoIterator for FormValues {
    type Item = (String, Vec<String>);
    type IntoIter = hash_map::IntoIter<String, Vec<String>>;

    fn into_iter(self) -> Self::IntoIter {
        self.inner.into_iter()
    }
}

/// Field name to the files uploaded under it.
///
/// Fields with no uploaded file never appear. Dropping the map releases the temporary
/// storage of every file still in it.
#[derive(Debug, Default)]
pub struct FormFiles {
    inner: HashMap<String, Vec<UploadedFile>>,
}

impl FormFiles {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&[UploadedFile]> {
        self.inner.get(name).map(Vec::as_slice)
    }

    /// Takes the files of `name` out of the map, handing their ownership to the caller.
    pub fn remove(&mut self, name: &str) -> Option<Vec<UploadedFile>> {
        self.inner.remove(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.inner.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn iter(&self) -> hash_map::Iter<'_, String, Vec<UploadedFile>> {
        self.inner.iter()
    }

    pub fn push(&mut self, name: impl Into<String>, file: UploadedFile) {
        self.inner.entry(name.into()).or_default().push(file);
    }

    pub fn into_inner(self) -> HashMap<String, Vec<UploadedFile>> {
        self.inner
    }
}

impl<'a> IntoIterator for &'a FormFiles {
    type Item = (&'a String, &'a Vec<UploadedFile>);
    type IntoIter = hash_map::Iter<'a, String, Vec<UploadedFile>>;

    fn into_iter(self) -> Self::IntoIter {
        self.inner.iter()
    }
}

impl IntoIterator for FormFiles {
    type Item = (String, Vec<UploadedFile>);
    type IntoIter = hash_map::IntoIter<String, Vec<UploadedFile>>;

    fn into_iter(self) -> Self::IntoIter {
        self.inner.into_iter()
    }
}

/// A successfully parsed form.
#[derive(Debug, Default)]
pub struct FormContent {
    pub values: FormValues,
    pub files: FormFiles,
}

impl FormContent {
    pub fn new(values: FormValues, files: FormFiles) -> Self {
        Self { values, files }
    }

    pub fn into_parts(self) -> (FormValues, FormFiles) {
        (self.values, self.files)
    }
}

impl From<FormValues> for FormContent {
    fn from(values: FormValues) -> Self {
        Self { values, files: FormFiles::new() }
    }
}
