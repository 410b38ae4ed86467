//! Colored terminal output macros.
//!
//! All termcolor operations use `let _ =` to deliberately ignore errors.
//! Colored output is decorative and non-essential: if stdout/stderr is
//! unavailable (broken pipe, no TTY), the program continues without colors.

/// Print a warning with a yellow marker.
#[macro_export]
macro_rules! warn {
    ($($arg:tt)*) => {{
        let bufwtr = termcolor::BufferWriter::stderr(termcolor::ColorChoice::Auto);
        let mut buffer = bufwtr.buffer();
        let _ = termcolor::WriteColor::set_color(
            &mut buffer,
            termcolor::ColorSpec::new().set_fg(Some(termcolor::Color::Yellow)),
        );
        let _ = std::io::Write::write_all(&mut buffer, "⚠️  ".as_bytes());
        let _ = termcolor::WriteColor::reset(&mut buffer);
        let _ = std::io::Write::write_fmt(&mut buffer, format_args!($($arg)*));
        let _ = std::io::Write::write_all(&mut buffer, b"\n");
        let _ = bufwtr.print(&buffer);
    }};
}

/// Print an error with a red marker.
#[macro_export]
macro_rules! error {
    ($($arg:tt)*) => {{
        let bufwtr = termcolor::BufferWriter::stderr(termcolor::ColorChoice::Auto);
        let mut buffer = bufwtr.buffer();
        let _ = termcolor::WriteColor::set_color(
            &mut buffer,
            termcolor::ColorSpec::new().set_fg(Some(termcolor::Color::Red)),
        );
        let _ = std::io::Write::write_all(&mut buffer, "❌ ".as_bytes());
        let _ = termcolor::WriteColor::reset(&mut buffer);
        let _ = std::io::Write::write_fmt(&mut buffer, format_args!($($arg)*));
        let _ = std::io::Write::write_all(&mut buffer, b"\n");
        let _ = bufwtr.print(&buffer);
    }};
}

/// Print a success message with a green marker.
#[macro_export]
macro_rules! success {
    ($($arg:tt)*) => {{
        let bufwtr = termcolor::BufferWriter::stdout(termcolor::ColorChoice::Auto);
        let mut buffer = bufwtr.buffer();
        let _ = termcolor::WriteColor::set_color(
            &mut buffer,
            termcolor::ColorSpec::new().set_fg(Some(termcolor::Color::Green)),
        );
        let _ = std::io::Write::write_all(&mut buffer, "✓ ".as_bytes());
        let _ = termcolor::WriteColor::reset(&mut buffer);
        let _ = std::io::Write::write_fmt(&mut buffer, format_args!($($arg)*));
        let _ = std::io::Write::write_all(&mut buffer, b"\n");
        let _ = bufwtr.print(&buffer);
    }};
}
