// This file is part of the rsed package.
//
// For the full copyright and license information, please view the LICENSE
// file that was distributed with this source code.

use std::ffi::OsString;
use std::process;

fn main() {
    uucore::panic::mute_sigpipe_panic();

    let mut args: Vec<OsString> = std::env::args_os().collect();

    // Strip .exe extension from binary name on Windows for consistent error messages
    #[cfg(windows)]
    if let Some(binary_name) = args.get_mut(0) {
        let binary_str = binary_name.to_string_lossy();
        if let Some(stripped) = binary_str.strip_suffix(".exe") {
            *binary_name = OsString::from(stripped);
        }
    }

    let code = rsed::sed::uumain(args.into_iter());
    process::exit(code);
}
