use std::{
    env,
    fs::File,
    io::Cursor,
    path::{Path, PathBuf},
    process,
};

use memmap::Mmap;
use rebyte_class_file::ClassFile;
use rebyte_jar::{ClassSource, JarFile};

fn main() {
    pretty_env_logger::init();

    let mut args = env::args().skip(1);
    let Some(path) = args.next().map(PathBuf::from) else {
        eprintln!("usage: rebyte <file.jar|file.class> [class-name]");
        process::exit(2);
    };
    let class_name = args.next();

    let file = File::open(&path).unwrap_or_else(|e| fail(&path, e));
    let mmap = unsafe { Mmap::map(&file) }.unwrap_or_else(|e| fail(&path, e));

    if path.extension().map_or(false, |ext| ext == "class") {
        match ClassFile::parse(&mmap) {
            Ok(class_file) => print_class(&path.display().to_string(), &class_file),
            Err(e) => fail(&path, e),
        }
        return;
    }

    let mut jar = JarFile::new(Cursor::new(&mmap[..])).unwrap_or_else(|e| fail(&path, e));
    match class_name {
        Some(name) => match jar.parse_class(&name) {
            Ok(class_file) => print_class(&name, &class_file),
            Err(e) => fail(&path, e),
        },
        None => {
            for entry in jar.auxiliary_entries() {
                println!("{} ({} bytes)", entry.path(), entry.size());
            }
            for (name, class_file) in jar.parse_classes() {
                match class_file {
                    Ok(class_file) => print_class(&name, &class_file),
                    Err(e) => {
                        log::warn!("Skipping {}", name);
                        eprintln!("{}: {}", name, e);
                    }
                }
            }
        }
    }
}

fn fail(path: &Path, e: impl std::fmt::Display) -> ! {
    eprintln!("{}: {}", path.display(), e);
    process::exit(1);
}

fn print_class(title: &str, class_file: &ClassFile) {
    println!();
    println!("Class: {}", title);
    println!(
        "    Version:      {}.{}",
        class_file.major_version(),
        class_file.minor_version()
    );
    println!(
        "    Access flags: {:?} (0x{:04X})",
        class_file.access_flags(),
        class_file.raw_access_flags()
    );
    println!("    Pool size:    {}", class_file.constant_pool().len());

    match class_file.class_name() {
        Ok(name) => println!("    Name:         {}", name),
        Err(e) => println!("    Name:         <{}>", e),
    }
    match class_file.super_class() {
        Ok(Some(name)) => println!("    Super class:  {}", name),
        Ok(None) => {}
        Err(e) => println!("    Super class:  <{}>", e),
    }
    match class_file.interface_names() {
        Ok(names) => names
            .iter()
            .for_each(|name| println!("    Implements:   {}", name)),
        Err(e) => println!("    Implements:   <{}>", e),
    }

    for field in class_file.fields() {
        println!(
            "    Field  {} {} {:?}",
            display(class_file.field_name(field)),
            display(class_file.field_descriptor(field)),
            field.access_flags
        );
    }
    for method in class_file.methods() {
        println!(
            "    Method {}{} {:?}",
            display(class_file.method_name(method)),
            display(class_file.method_descriptor(method)),
            method.access_flags
        );
    }
}

fn display<T: std::fmt::Display, E: std::fmt::Display>(r: Result<T, E>) -> String {
    match r {
        Ok(v) => v.to_string(),
        Err(e) => format!("<{}>", e),
    }
}
