// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::path::Path;

fn main() -> anyhow::Result<()> {
    let default =
        Path::new(env!("CARGO_MANIFEST_DIR")).join("../power-mode.toml");
    build_power_config::codegen(build_power_config::Image::Secondary, &default)
}
