// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2026 DocLite

pub mod tempdir;
