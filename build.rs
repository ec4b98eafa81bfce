//! Build script for DupeLink
//!
//! This build script handles platform-specific configuration:
//! - Windows: Embeds the application manifest for long path support (>260 chars)
//!
//! # Windows Long Path Support
//!
//! By default, Windows limits file paths to 260 characters (MAX_PATH).
//! Deduplication runs over whole directory trees, so deeply nested paths
//! (node_modules and the like) routinely exceed this limit.
//!
//! The manifest file (`dupelink.manifest`) includes `longPathAware=true`
//! which, combined with the Windows 10 v1607+ registry setting, enables
//! paths up to 32,767 characters.
//!
//! # Usage
//!
//! This script runs automatically during `cargo build`. No manual intervention
//! is required. On non-Windows platforms, the script does nothing.

fn main() {
    // Only compile and embed the manifest on Windows
    #[cfg(windows)]
    {
        // Use embed-resource to compile the .rc file which references the manifest
        // The .rc file uses RT_MANIFEST resource type to embed the XML manifest
        embed_resource::compile("dupelink.rc", embed_resource::NONE);

        // Instruct Cargo to re-run this build script if either file changes
        println!("cargo:rerun-if-changed=dupelink.rc");
        println!("cargo:rerun-if-changed=dupelink.manifest");
    }

    #[cfg(not(windows))]
    {
        // Nothing to embed on other platforms
    }
}
