// Copyright 2025 JiangLong.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::env;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Locates executables. Only ever reads the filesystem.
pub trait ExecutableLookup: Send + Sync {
    fn find(&self, program: &str) -> Option<PathBuf>;
}

/// Looks programs up on a `PATH`-style search path.
#[derive(Debug, Clone, Default)]
pub struct SearchPathLookup {
    search_path: Option<OsString>,
}

impl SearchPathLookup {
    pub fn from_env() -> Self {
        Self {
            search_path: env::var_os("PATH"),
        }
    }

    pub fn with_search_path(search_path: impl Into<OsString>) -> Self {
        Self {
            search_path: Some(search_path.into()),
        }
    }
}

impl ExecutableLookup for SearchPathLookup {
    fn find(&self, program: &str) -> Option<PathBuf> {
        let search_path = self.search_path.as_ref()?;
        env::split_paths(search_path).find_map(|dir| executable_in(&dir, program))
    }
}

#[cfg(unix)]
fn executable_in(dir: &Path, program: &str) -> Option<PathBuf> {
    use std::os::unix::fs::PermissionsExt;

    let candidate = dir.join(program);
    let metadata = std::fs::metadata(&candidate).ok()?;
    (metadata.is_file() && metadata.permissions().mode() & 0o111 != 0).then_some(candidate)
}

#[cfg(not(unix))]
fn executable_in(dir: &Path, program: &str) -> Option<PathBuf> {
    [dir.join(program), dir.join(format!("{}.exe", program))]
        .into_iter()
        .find(|candidate| candidate.is_file())
}
