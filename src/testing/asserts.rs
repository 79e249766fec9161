// Copyright 2023-5 Seth Pendergrass. See LICENSE.

//! Extra asserts to make tests shorter / more readable.

#[macro_export]
macro_rules! assert_dir {
  ($dir:expr, [$($path:literal),* $(,)?]) => {{
    let actual = $dir.files();
    let expected = std::collections::HashSet::from([$($dir.get_path($path)),*]);

    assert!(
      actual == expected,
      "Directory contents do not match:\nActual:   {actual:#?}\nExpected: {expected:#?}"
    );
  }}
}

#[macro_export]
macro_rules! assert_err {
  ($res:expr, $msg:literal) => {{
    let Err(e) = $res else {
      panic!("Unexpected `Ok`.");
    };

    assert!(
      e.contains($msg),
      "Error message did not contain expected substring.\nActual:\n{e}\nExpected:\n{}",
      $msg
    );
  }};
}

#[macro_export]
macro_rules! assert_tag {
  // Tag should not be present.
  ($dir:expr, $file:literal, $tag:literal,None) => {{
    let actual = $dir.store().read_tag($dir.get_path($file), $tag);

    if let Some(actual) = actual {
      panic!(
        "{:?}:\nUnexpected `{}`:\n\tActual:   `{}`\n\tExpected: `None`",
        $dir.get_path($file),
        $tag,
        actual
      );
    }
  }};

  ($dir:expr, $file:literal, $tag:literal, $expected:literal) => {{
    let Some(actual) = $dir.store().read_tag($dir.get_path($file), $tag) else {
      panic!(
        "{:?}:\nUnexpected `{}`:\n\tActual:   `None`\n\tExpected: `{}`",
        $dir.get_path($file),
        $tag,
        $expected
      );
    };

    assert!(
      actual == $expected,
      "{:?}:\nUnexpected `{}`:\n\tActual:   `{}`\n\tExpected: `{}`",
      $dir.get_path($file),
      $tag,
      actual,
      $expected,
    );
  }};
}
