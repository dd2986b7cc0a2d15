fn main() {
    if let Ok(target) = std::env::var("TARGET") {
        println!("cargo:rustc-env=THALES_REMOTE_BUILD_TARGET={target}");
    }
    if let Ok(profile) = std::env::var("PROFILE") {
        println!("cargo:rustc-env=THALES_REMOTE_BUILD_PROFILE={profile}");
    }
    println!("cargo:rerun-if-env-changed=TARGET");
    println!("cargo:rerun-if-env-changed=PROFILE");
}
