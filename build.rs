fn main() {
    #[cfg(feature = "desktop")]
    tauri_build::build();
    println!("cargo:rustc-check-cfg=cfg(mobile)");
}
