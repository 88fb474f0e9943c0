#![allow(unused_imports)]

pub(crate) use crate::error::Error;
pub(crate) use crate::lin_search_hint::*;
pub(crate) use crate::si;
pub(crate) use crate::traits::*;
pub(crate) use crate::uc;
pub(crate) use crate::utils;
pub(crate) use crate::utils::{almost_eq, almost_eq_uom};
pub(crate) use anyhow::{anyhow, bail, ensure, Context};
pub(crate) use glam::DVec3;
pub(crate) use log::{debug, info, trace, warn};
pub(crate) use serde::{Deserialize, Serialize};
pub(crate) use std::cmp::{self, Ordering};
pub(crate) use std::ffi::OsStr;
pub(crate) use std::fmt;
pub(crate) use std::fs::File;
pub(crate) use std::path::{Path, PathBuf};
pub(crate) use trackside_proc_macros::HistoryVec;
pub(crate) use uom::ConstZero;
