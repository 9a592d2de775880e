//! Emacs Lisp helper programs, passed verbatim to `emacs --eval` or
//! `cask eval`. Their output formats are the contract with `elisp.rs`.

/// Searches the ELPA archives. Invoked as
/// `emacs -Q --batch --eval (progn SEARCH_INFO) DIR ACTION ARG`, where DIR is
/// a scratch `package-user-dir`, ACTION is `search` or `info`, and ARG is the
/// query (split on whitespace, all words must match) or the package name.
/// Prints a JSON array of package records for `search` (ordered by name
/// length, `null` when empty) and one record or `null` for `info`.
pub const SEARCH_INFO: &str = r##"
(require 'cl-lib)
(require 'json)
(require 'map)
(require 'package)
(require 'subr-x)

;; MELPA first: it has more up-to-date versions.
(setq package-archives '((melpa . "https://melpa.org/packages/")
                         (gnu . "https://elpa.gnu.org/packages/")
                         (org . "https://orgmode.org/elpa/")))

(defun upm-convert-package-desc (desc)
  "Convert package descriptor DESC to an alist shaped like a package record."
  (let ((extras (package-desc-extras desc)))
    `((name . ,(symbol-name (package-desc-name desc)))
      (description . ,(package-desc-summary desc))
      (version . ,(package-version-join (package-desc-version desc)))
      (homepageURL . ,(alist-get :url extras))
      (author . ,(when-let ((mnt (alist-get :maintainer extras)))
                   (let ((parts nil))
                     (when-let ((email (cdr mnt)))
                       (push (format "<%s>" email) parts))
                     (when-let ((name (car mnt)))
                       (push name parts))
                     (when parts
                       (string-join parts " ")))))
      (dependencies . ,(cl-remove-if
                        (lambda (dep)
                          (string= dep "emacs"))
                        (mapcar
                         (lambda (link)
                           (symbol-name (car link)))
                         (package-desc-reqs desc)))))))

(defun upm-package-info (package)
  "Given PACKAGE string, return alist of metadata for it, or nil."
  (when-let ((descs (alist-get (intern package) package-archive-contents)))
    ;; package.el lists the first archive's descriptor last.
    (upm-convert-package-desc
     (car (last descs)))))

(defvar upm-num-archives-fetched 0
  "Number of package.el archives which have been fetched so far.")

(defun upm-download-callback (status archive-id action arg)
  "Callback for `url-retrieve' on a package.el archive."
  (cl-loop for (event data) on status by #'cddr
           do (when (eq event :error)
                (signal (car data) (cdr data))))
  (let* ((archives-dir (expand-file-name "archives" package-user-dir))
         (archive-dir (expand-file-name
                       (symbol-name archive-id) archives-dir))
         (json-encoding-pretty-print t))
    (make-directory archive-dir 'parents)
    (delete-region (point-min) url-http-end-of-headers)
    (write-file (expand-file-name "archive-contents" archive-dir))
    (when (>= (cl-incf upm-num-archives-fetched) (length package-archives))
      (package-read-all-archive-contents)
      (pcase action
        ("search"
         (let ((queries (mapcar
                         #'regexp-quote (split-string arg nil 'omit-nulls))))
           (thread-last package-archive-contents
             (map-keys)
             (mapcar #'symbol-name)
             (cl-remove-if-not (lambda (package)
                                 (cl-every (lambda (query)
                                             (string-match-p query package))
                                           queries)))
             (funcall (lambda (packages)
                        (cl-sort packages #'< :key #'length)))
             (mapcar #'upm-package-info)
             (json-encode)
             (princ))
           (terpri)))
        ("info"
         (princ
          (json-encode (upm-package-info arg)))
         (terpri))
        (_ (error "No such action: %S" action))))))

(cl-destructuring-bind (dir action arg) command-line-args-left
  (setq command-line-args-left nil)
  (setq package-user-dir dir)
  (dolist (link package-archives)
    (url-retrieve
     (concat (cdr link) "archive-contents")
     #'upm-download-callback
     (list (car link) action arg)
     'silent)))

(while (< upm-num-archives-fetched (length package-archives))
  (accept-process-output nil 0.05))
"##;

/// Evaluated by `cask eval` after `cask install`. Prints every installed
/// package as `name=version`, one per line.
pub const INSTALLED_PACKAGES: &str = r##"
(dolist (dir load-path)
  (when (string-match "elpa/\\(.+\\)-\\([^-]+\\)" dir)
    (princ (format "%s=%s\n"
                   (match-string 1 dir)
                   (match-string 2 dir)))))
"##;

/// Evaluated by `cask eval`. Prints every runtime and development dependency
/// declared in the Cask file as `name=spec`, one per line.
pub const LIST_SPECFILE: &str = r##"
(let* ((bundle (cask-cli--bundle))
       (deps (append (cask-runtime-dependencies bundle)
                     (cask-development-dependencies bundle))))
  (dolist (d deps)
    (let ((fetcher (cask-dependency-fetcher d))
          (url (cask-dependency-url d))
          (files (cask-dependency-files d))
          (ref (cask-dependency-ref d))
          (branch (cask-dependency-branch d)))
      (princ (format "%S=%s%s%s%s\n"
                     (cask-dependency-name d)
                     (if fetcher (format "%S %S" fetcher url) "")
                     (if files (format ":files %S" files) "")
                     (if ref (format ":ref %S" ref) "")
                     (if branch (format ":branch %S" branch) ""))))))
"##;
